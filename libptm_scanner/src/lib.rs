//! # ptm_scanner
//!
//! ptm_scanner makes it quick and easy to produce lots of PTM (production
//! target monitor) plots from beam-simulation output, and to extract simple
//! stats from them. It reads the virtual-detector and sensitive-detector hit
//! ntuples written by the simulation, aggregates the hits into per-channel
//! histograms, converts the deposited ionizing energy in the PWC wire planes
//! into a simulated scanner voltage signal, and renders everything as saved
//! plots.
//!
//! The PTM itself is a pair of proportional wire chambers (PWCs), each with
//! one vertical and one horizontal plane of 48 sense wires spaced 2 mm
//! apart. In the simulation each wire's gas volume is a separate sensitive
//! detector, so a wire plane shows up in the data as a contiguous block of
//! 48 volume ids.
//!
//! ## Input data
//!
//! Simulation jobs write their output as directory trees of Parquet ntuple
//! files named in the `nts.otherStuffHere.parquet` convention, one
//! subdirectory per readback stream (for example `readPTM/ntPTM` for the
//! PWC sensitive volumes, `readvdNr/ntvd` for the near PWC virtual
//! detector). [`chain::ChainAssembler`] walks a job directory recursively
//! and concatenates the files of one stream into a single logical
//! [`chain::Chain`], read lazily through polars.
//!
//! Some of this functionality, like the production target histograms,
//! assumes the data was generated with the production target virtual
//! detectors moved flush to the ends of the target.
//!
//! ## Output
//!
//! One SVG file per histogram, named from the configured job name. A full
//! run of every pass produces:
//!
//! - `<job>_POT`, `<job>_prots_out_targ_back`, `<job>_all_out_targ_back`
//! - `<job>_near_PWC_prots`, `<job>_near_PWC_all`, `<job>_far_PWC_prots`,
//!   `<job>_far_PWC_all`
//! - `<job>PTM_ionizing_{horiz,vert}{1,2}`
//! - `<job>_{horiz,vert}Signal_{1,2}`
//!
//! Downstream consumers key on these names; do not change them casually.
//!
//! ## Configuration
//!
//! [`config::Config`] is serializable to YAML with serde_yaml, in the
//! following format:
//!
//! ```yml
//! data_path: None
//! output_path: .
//! job_name: ''
//! make_target_hists: false
//! make_ptm_virtual_hists: false
//! make_scanner_plots: false
//! retain_hists: false
//! print_accounting: false
//! signal_conversion_const: 0.01759
//! total_signal_err: 0.05
//! target_front_ntuple: readvdPTFront/ntvd
//! target_back_ntuple: readvdPTBack/ntvd
//! near_pwc_ntuple: readvdNr/ntvd
//! far_pwc_ntuple: readvdFr/ntvd
//! scanner_ntuple: readPTM/ntPTM
//! ```
//!
//! The `data_path` and `job_name` fields must be given real values before
//! anything runs; the rest have usable defaults. The signal conversion
//! constant is scaled so that 1e6 protons in a narrow peak give a 9.5 V
//! signal peak; raising it is similar to raising the bias voltage on a real
//! detector.
//!
//! ## Using the library
//!
//! [`plot_maker::PlotMaker`] drives everything from a [`config::Config`]
//! and returns the retained histograms in a [`plot_maker::HistStore`] when
//! asked to. The readers ([`scanner_reader::ScannerReader`],
//! [`virtual_reader::VirtDetReader`]) can also be called on their own
//! against any [`chain::Chain`]; they include some functionality the plot
//! maker does not use, like the per-particle energy-deposit distribution
//! and the particle accounting.
pub mod accounting;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod hit;
pub mod plot;
pub mod plot_maker;
pub mod scanner_reader;
pub mod signal;
pub mod virtual_reader;
