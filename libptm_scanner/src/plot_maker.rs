use std::path::{Path, PathBuf};

use fxhash::FxHashMap;

use super::chain::{Chain, ChainAssembler};
use super::config::Config;
use super::constants::PLOT_EXTENSION;
use super::error::PlotMakerError;
use super::geometry::{FrameTransform, ScannerGeometry};
use super::histogram::{Hist1d, Hist2d};
use super::plot::{render_hist1d, render_hist2d};
use super::scanner_reader::ScannerReader;
use super::signal::{derive_signal, distribute_bin_errors};
use super::virtual_reader::VirtDetReader;

/// Histograms retained from a plotting pass, keyed by histogram name.
///
/// Retention is the caller's choice: when the config says retain, every pass
/// deposits its histograms here for later inspection or re-rendering;
/// otherwise they are dropped as soon as their plot file is written.
#[derive(Debug, Clone, Default)]
pub struct HistStore {
    hists_1d: FxHashMap<String, Hist1d>,
    hists_2d: FxHashMap<String, Hist2d>,
}

impl HistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_1d(&mut self, hist: Hist1d) {
        self.hists_1d.insert(hist.name.clone(), hist);
    }

    pub fn insert_2d(&mut self, hist: Hist2d) {
        self.hists_2d.insert(hist.name.clone(), hist);
    }

    pub fn hist_1d(&self, name: &str) -> Option<&Hist1d> {
        self.hists_1d.get(name)
    }

    pub fn hist_1d_mut(&mut self, name: &str) -> Option<&mut Hist1d> {
        self.hists_1d.get_mut(name)
    }

    pub fn hist_2d(&self, name: &str) -> Option<&Hist2d> {
        self.hists_2d.get(name)
    }

    pub fn hist_2d_mut(&mut self, name: &str) -> Option<&mut Hist2d> {
        self.hists_2d.get_mut(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .hists_1d
            .keys()
            .chain(self.hists_2d.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.hists_1d.len() + self.hists_2d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hists_1d.is_empty() && self.hists_2d.is_empty()
    }
}

/// Drives the whole pipeline: assembles the per-channel chains, runs the
/// readers, derives the scanner signals, and writes one plot file per
/// histogram into the configured output directory.
#[derive(Debug)]
pub struct PlotMaker {
    config: Config,
    geometry: ScannerGeometry,
    target_front_chain: Option<Chain>,
    target_back_chain: Option<Chain>,
    near_pwc_chain: Option<Chain>,
    far_pwc_chain: Option<Chain>,
    scanner_chain: Option<Chain>,
}

impl PlotMaker {
    pub fn new(config: Config) -> Self {
        Self::with_geometry(config, ScannerGeometry::default())
    }

    pub fn with_geometry(config: Config, geometry: ScannerGeometry) -> Self {
        Self {
            config,
            geometry,
            target_front_chain: None,
            target_back_chain: None,
            near_pwc_chain: None,
            far_pwc_chain: None,
            scanner_chain: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn assemble(&self, selector: &Path) -> Result<Chain, PlotMakerError> {
        let mut assembler = ChainAssembler::new();
        assembler.job_dir_path = Some(self.config.data_path.clone());
        assembler.ntuple_path = Some(selector.to_path_buf());
        let chain = assembler.create_chain()?;
        log::info!(
            "Created chain from {} using {} data files ({})",
            selector.display(),
            chain.len(),
            human_bytes::human_bytes(chain.total_size_bytes() as f64)
        );
        Ok(chain)
    }

    /// Assemble the chains for every enabled plot group.
    pub fn gather_chains(&mut self) -> Result<(), PlotMakerError> {
        self.config.check_required_fields()?;
        log::debug!("Gathering chains...");
        if self.config.make_target_hists {
            self.target_front_chain = Some(self.assemble(&self.config.target_front_ntuple)?);
            self.target_back_chain = Some(self.assemble(&self.config.target_back_ntuple)?);
        }
        if self.config.make_ptm_virtual_hists {
            self.near_pwc_chain = Some(self.assemble(&self.config.near_pwc_ntuple)?);
            self.far_pwc_chain = Some(self.assemble(&self.config.far_pwc_ntuple)?);
        }
        if self.config.make_scanner_plots {
            self.scanner_chain = Some(self.assemble(&self.config.scanner_ntuple)?);
        }
        log::debug!("...Chains gathered");
        Ok(())
    }

    fn require_chain<'a>(
        chain: &'a Option<Chain>,
        label: &'static str,
    ) -> Result<&'a Chain, PlotMakerError> {
        chain.as_ref().ok_or(PlotMakerError::MissingChain(label))
    }

    fn out_path(&self, stem: &str) -> PathBuf {
        self.config
            .output_path
            .join(format!("{stem}.{PLOT_EXTENSION}"))
    }

    /// Histograms of protons on target: beam protons incident on the front
    /// face, primaries surviving out the back, and everything off the back.
    pub fn save_target_hists(&self, store: &mut HistStore) -> Result<(), PlotMakerError> {
        log::debug!("Making and saving proton target histograms");
        let front = Self::require_chain(&self.target_front_chain, "target front virtual detector")?;
        let back = Self::require_chain(&self.target_back_chain, "target back virtual detector")?;
        let reader = VirtDetReader::new();
        let job = &self.config.job_name;

        // Protons incident on the front face of the target
        let pot = reader.position_hist(
            front,
            &format!("{job} POT"),
            None,
            Some(&[1]),
            100,
            Some(&FrameTransform::target_front()),
        )?;
        render_hist2d(&pot, &self.out_path(&format!("{job}_POT")))?;
        log::debug!("POT hist done");

        // Primary beam protons that make it through/past the target
        let out_prots = reader.position_hist(
            back,
            &format!("{job} p+ out target back"),
            None,
            Some(&[1]),
            100,
            Some(&FrameTransform::target_back()),
        )?;
        render_hist2d(&out_prots, &self.out_path(&format!("{job}_prots_out_targ_back")))?;
        log::debug!("Primary protons out back done");

        // ALL particles coming off the back of the target
        let back_all = reader.position_hist(
            back,
            &format!("{job} all out target back"),
            None,
            None,
            100,
            Some(&FrameTransform::target_back()),
        )?;
        render_hist2d(&back_all, &self.out_path(&format!("{job}_all_out_targ_back")))?;
        log::debug!("All particles out back done");

        if self.config.retain_hists {
            store.insert_2d(pot);
            store.insert_2d(out_prots);
            store.insert_2d(back_all);
        }
        log::debug!("Proton target histograms done");
        Ok(())
    }

    /// 2D occupancies on the near and far PWC virtual detectors, for the
    /// primary beam alone and for all particles.
    pub fn save_ptm_virtual_hists(&self, store: &mut HistStore) -> Result<(), PlotMakerError> {
        log::debug!("Making and saving PTM histograms");
        let near = Self::require_chain(&self.near_pwc_chain, "near PWC virtual detector")?;
        let far = Self::require_chain(&self.far_pwc_chain, "far PWC virtual detector")?;
        let reader = VirtDetReader::new();
        let job = &self.config.job_name;
        let flip = FrameTransform::ptm_local();

        let near_prots = reader.position_hist(
            near,
            &format!("{job} beam p+ on near PWC"),
            None,
            Some(&[1]),
            100,
            Some(&flip),
        )?;
        log::debug!("Made hist with name {}", near_prots.name);
        render_hist2d(&near_prots, &self.out_path(&format!("{job}_near_PWC_prots")))?;
        let near_all = reader.position_hist(
            near,
            &format!("{job} all particles on near PWC"),
            None,
            None,
            100,
            Some(&flip),
        )?;
        render_hist2d(&near_all, &self.out_path(&format!("{job}_near_PWC_all")))?;
        log::debug!("Near PWC 2D histograms done");

        let far_prots = reader.position_hist(
            far,
            &format!("{job} beam p+ on far PWC"),
            None,
            Some(&[1]),
            100,
            None,
        )?;
        render_hist2d(&far_prots, &self.out_path(&format!("{job}_far_PWC_prots")))?;
        let far_all = reader.position_hist(
            far,
            &format!("{job} all particles on far PWC"),
            None,
            None,
            100,
            None,
        )?;
        render_hist2d(&far_all, &self.out_path(&format!("{job}_far_PWC_all")))?;
        log::debug!("Far PWC 2D histograms done");

        if self.config.retain_hists {
            store.insert_2d(near_prots);
            store.insert_2d(near_all);
            store.insert_2d(far_prots);
            store.insert_2d(far_all);
            log::debug!("Keys in store: {:?}", store.names());
        }
        log::debug!("PTM histograms done");
        Ok(())
    }

    /// The wire-plane ionizing-energy profiles and the voltage signals
    /// derived from them.
    pub fn save_scanner_plots(&self, store: &mut HistStore) -> Result<(), PlotMakerError> {
        log::debug!("Making and saving scanner plots");
        let chain = Self::require_chain(&self.scanner_chain, "PWC sensitive volume")?;
        let reader = ScannerReader::with_geometry(self.geometry.clone());
        let job = &self.config.job_name;

        let mut profiles = reader.ionizing_profiles(chain, &format!("{job}PTM_ionizing_"), None)?;
        profiles.horiz1.title = String::from("PTM PWC #1 horizontal: ionizing E dep");
        profiles.horiz2.title = String::from("PTM PWC #2 horizontal: ionizing E dep");
        profiles.vert1.title = String::from("PTM PWC #1 vertical: ionizing E dep");
        profiles.vert2.title = String::from("PTM PWC #2 vertical: ionizing E dep");
        for profile in profiles.all() {
            render_hist1d(profile, &self.out_path(&profile.name), false)?;
        }
        log::debug!("Ionizing energy deposit profiles done");

        // Now the voltage signal plots
        let planes = [
            (&profiles.horiz1, "horizSignal_1", "PTM PWC #1 horizontal: scanner signal"),
            (&profiles.horiz2, "horizSignal_2", "PTM PWC #2 horizontal: scanner signal"),
            (&profiles.vert1, "vertSignal_1", "PTM PWC #1 vertical: scanner signal"),
            (&profiles.vert2, "vertSignal_2", "PTM PWC #2 vertical: scanner signal"),
        ];
        let mut signals = Vec::with_capacity(planes.len());
        for (profile, suffix, title) in planes {
            let mut signal = derive_signal(
                profile,
                self.config.signal_conversion_const,
                &format!("{job}_{suffix}"),
            );
            distribute_bin_errors(
                &mut signal,
                self.config.total_signal_err,
                self.geometry.wires_per_plane,
            );
            signal.title = title.to_string();
            render_hist1d(&signal, &self.out_path(&signal.name), true)?;
            signals.push(signal);
        }

        if self.config.retain_hists {
            store.insert_1d(profiles.horiz1);
            store.insert_1d(profiles.horiz2);
            store.insert_1d(profiles.vert1);
            store.insert_1d(profiles.vert2);
            for signal in signals {
                store.insert_1d(signal);
            }
        }
        log::debug!("All PWC scanner plots done");
        Ok(())
    }

    /// Log the per-species accounting of the near PWC virtual detector
    /// stream.
    pub fn log_accounting(&self) -> Result<(), PlotMakerError> {
        let near = Self::require_chain(&self.near_pwc_chain, "near PWC virtual detector")?;
        let reader = VirtDetReader::new();
        let accounting = reader.particle_accounting(near)?;
        let mut pdg_ids: Vec<i64> = accounting.keys().copied().collect();
        pdg_ids.sort_unstable();
        for pdg_id in pdg_ids {
            let record = &accounting[&pdg_id];
            log::info!(
                "pdg {pdg_id}: count {}, KE mean {:.3} MeV, KE stdev {:.3} MeV",
                record.count,
                record.ke_mean(),
                record.ke_stdev()
            );
        }
        Ok(())
    }

    /// Run every enabled pass, returning the retained histograms (empty when
    /// the config says discard after rendering).
    pub fn make_all_plots(&mut self) -> Result<HistStore, PlotMakerError> {
        log::info!("About to make all plots for job {}", self.config.job_name);
        self.gather_chains()?;
        std::fs::create_dir_all(&self.config.output_path)?;
        let mut store = HistStore::new();
        if self.config.make_target_hists {
            self.save_target_hists(&mut store)?;
        }
        if self.config.make_ptm_virtual_hists {
            self.save_ptm_virtual_hists(&mut store)?;
        }
        if self.config.make_scanner_plots {
            self.save_scanner_plots(&mut store)?;
        }
        if self.config.print_accounting && self.config.make_ptm_virtual_hists {
            self.log_accounting()?;
        }
        log::info!("Finished all plots for job {}", self.config.job_name);
        Ok(store)
    }

    /// Re-render every retained histogram into the output directory.
    pub fn redraw(&self, store: &HistStore) -> Result<(), PlotMakerError> {
        if store.is_empty() {
            log::warn!("No held hists to re-save");
            return Ok(());
        }
        for hist in store.hists_1d.values() {
            // Error bars were only ever set on the signal hists; keep them
            let error_bars = hist.errors().iter().any(|error| *error != 0.0);
            render_hist1d(hist, &self.out_path(&hist.name), error_bars)?;
        }
        for hist in store.hists_2d.values() {
            render_hist2d(hist, &self.out_path(&hist.name))?;
        }
        log::debug!("Re-saved all held hists");
        Ok(())
    }

    /// Drop the chains and job identity so this instance can be pointed at a
    /// different data set. Flags, selectors, and signal parameters survive.
    pub fn clear_data(&mut self) {
        log::debug!("Clearing internal data so this instance can be used again");
        self.config.data_path = PathBuf::from("None");
        self.config.job_name.clear();
        self.target_front_chain = None;
        self.target_back_chain = None;
        self.near_pwc_chain = None;
        self.far_pwc_chain = None;
        self.scanner_chain = None;
    }

    pub fn set_data_path(&mut self, data_path: PathBuf) {
        self.config.data_path = data_path;
    }

    pub fn set_job_name(&mut self, job_name: String) {
        self.config.job_name = job_name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::fs::{create_dir_all, File};

    use crate::hit::{
        EVENT_COLUMN, IEDEP_COLUMN, KE_COLUMN, PDG_COLUMN, TRACK_COLUMN, VOLUME_COLUMN, X_COLUMN,
        Y_COLUMN, Z_COLUMN,
    };

    fn write_stream(data_dir: &Path, selector: &str, sequencer: u32, df: &mut DataFrame) {
        let stream_dir = data_dir.join(selector);
        create_dir_all(&stream_dir).unwrap();
        let file =
            File::create(stream_dir.join(format!("nts.test.job.{sequencer:03}.parquet"))).unwrap();
        ParquetWriter::new(file).finish(df).unwrap();
    }

    fn sample_frame() -> DataFrame {
        df!(
            EVENT_COLUMN => &[1i64, 1, 2, 2, 3],
            TRACK_COLUMN => &[1i64, 2, 1, 3, 1],
            PDG_COLUMN => &[2212i64, 11, 2212, 211, 2212],
            VOLUME_COLUMN => &[0i64, 24, 48, 96, 144],
            X_COLUMN => &[1.0f64, -2.0, 3.0, -4.0, 5.0],
            Y_COLUMN => &[2.0f64, -1.0, 4.0, -3.0, 0.5],
            Z_COLUMN => &[0.0f64, 0.0, 0.0, 0.0, 0.0],
            KE_COLUMN => &[8000.0f64, 10.0, 7900.0, 350.0, 7950.0],
            IEDEP_COLUMN => &[0.002f64, 0.0001, 0.0015, 0.0004, 0.0022],
        )
        .unwrap()
    }

    fn full_config(data_dir: &Path, out_dir: &Path) -> Config {
        let mut config = Config::default();
        config.data_path = data_dir.to_path_buf();
        config.output_path = out_dir.to_path_buf();
        config.job_name = String::from("testjob");
        config.make_target_hists = true;
        config.make_ptm_virtual_hists = true;
        config.make_scanner_plots = true;
        config.retain_hists = true;
        config
    }

    #[test]
    fn test_unset_config_is_an_error() {
        let mut maker = PlotMaker::new(Config::default());
        assert!(matches!(
            maker.make_all_plots(),
            Err(PlotMakerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_pass_without_chain_is_an_error() {
        let maker = PlotMaker::new(Config::default());
        let mut store = HistStore::new();
        assert!(matches!(
            maker.save_scanner_plots(&mut store),
            Err(PlotMakerError::MissingChain(_))
        ));
    }

    #[test]
    fn test_make_all_plots_end_to_end() {
        let data_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        for selector in [
            "readvdPTFront/ntvd",
            "readvdPTBack/ntvd",
            "readvdNr/ntvd",
            "readvdFr/ntvd",
            "readPTM/ntPTM",
        ] {
            write_stream(data_dir.path(), selector, 1, &mut sample_frame());
            write_stream(data_dir.path(), selector, 2, &mut sample_frame());
        }

        let config = full_config(data_dir.path(), out_dir.path());
        let mut maker = PlotMaker::new(config);
        let store = maker.make_all_plots().unwrap();

        for stem in [
            "testjob_POT",
            "testjob_prots_out_targ_back",
            "testjob_all_out_targ_back",
            "testjob_near_PWC_prots",
            "testjob_near_PWC_all",
            "testjob_far_PWC_prots",
            "testjob_far_PWC_all",
            "testjobPTM_ionizing_horiz1",
            "testjobPTM_ionizing_horiz2",
            "testjobPTM_ionizing_vert1",
            "testjobPTM_ionizing_vert2",
            "testjob_horizSignal_1",
            "testjob_horizSignal_2",
            "testjob_vertSignal_1",
            "testjob_vertSignal_2",
        ] {
            assert!(
                out_dir.path().join(format!("{stem}.svg")).exists(),
                "missing plot {stem}"
            );
        }

        // Everything was retained: 3 target + 4 PWC occupancies, 4 profiles
        // and 4 signals
        assert_eq!(store.len(), 15);
        let signal = store.hist_1d("testjob_horizSignal_1").unwrap();
        // Two files, one horiz1 hit of 0.0015 MeV each, scaled to volts
        let expected = 2.0 * 0.0015 * 0.01759;
        assert!((signal.sum() - expected).abs() < 1e-12);
        assert!(signal.errors()[0] > 0.0);

        // Redraw from the retained set
        maker.redraw(&store).unwrap();

        maker.clear_data();
        assert!(maker.config().job_name.is_empty());
        assert!(matches!(
            maker.save_scanner_plots(&mut HistStore::new()),
            Err(PlotMakerError::MissingChain(_))
        ));
    }

    #[test]
    fn test_redraw_keeps_error_bars() {
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output_path = out_dir.path().to_path_buf();
        let maker = PlotMaker::new(config);

        let mut signal = Hist1d::new("sig", 4, 0.0, 4.0);
        signal.fill_weighted(0.5, 1.0);
        signal.set_bin_error(0, 0.1);
        let mut store = HistStore::new();
        store.insert_1d(signal.clone());
        maker.redraw(&store).unwrap();

        // Identical to rendering the hist with error bars requested
        let reference = out_dir.path().join("reference.svg");
        render_hist1d(&signal, &reference, true).unwrap();
        let redrawn = std::fs::read_to_string(out_dir.path().join("sig.svg")).unwrap();
        assert_eq!(redrawn, std::fs::read_to_string(&reference).unwrap());
    }

    #[test]
    fn test_discard_policy_returns_empty_store() {
        let data_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_stream(data_dir.path(), "readPTM/ntPTM", 1, &mut sample_frame());

        let mut config = full_config(data_dir.path(), out_dir.path());
        config.make_target_hists = false;
        config.make_ptm_virtual_hists = false;
        config.retain_hists = false;
        let mut maker = PlotMaker::new(config);
        let store = maker.make_all_plots().unwrap();
        assert!(store.is_empty());
        assert!(out_dir.path().join("testjobPTM_ionizing_horiz1.svg").exists());
    }
}
