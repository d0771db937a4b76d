use super::constants::{WIRES_PER_PLANE, WIRE_SPACING_MM};

/// The four signal planes of the two PWCs, in the order their volume-id
/// blocks appear in the detector construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerPlane {
    Vertical1,
    Horizontal1,
    Vertical2,
    Horizontal2,
}

/// The wire-plane geometry of the PTM scanner: how many wires per plane, how
/// far apart they sit, and which contiguous volume-id block belongs to which
/// plane.
///
/// The ranges are inclusive on both ends and are defined disjoint by
/// convention; an overlapping misconfiguration is not detected and the first
/// matching range wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerGeometry {
    pub wires_per_plane: i64,
    pub wire_spacing_mm: f64,
    pub vert1_vol_ids: (i64, i64),
    pub horiz1_vol_ids: (i64, i64),
    pub vert2_vol_ids: (i64, i64),
    pub horiz2_vol_ids: (i64, i64),
}

impl Default for ScannerGeometry {
    fn default() -> Self {
        Self {
            wires_per_plane: WIRES_PER_PLANE,
            wire_spacing_mm: WIRE_SPACING_MM,
            vert1_vol_ids: (0, 47),
            horiz1_vol_ids: (48, 95),
            vert2_vol_ids: (96, 143),
            horiz2_vol_ids: (144, 191),
        }
    }
}

impl ScannerGeometry {
    /// Map a volume id to the wire position on its plane, in mm.
    ///
    /// With the standard 48-wire planes this maps each 48-id block onto
    /// -48..+46 in steps of 2.
    pub fn vol_id_to_position(&self, vol_id: i64) -> f64 {
        let num_on_plane = vol_id % self.wires_per_plane;
        let centered = num_on_plane - self.wires_per_plane / 2;
        centered as f64 * self.wire_spacing_mm
    }

    /// Which plane a volume id belongs to, if any. Hits matching no plane are
    /// simply not scanner hits; callers drop them silently.
    pub fn plane_for(&self, vol_id: i64) -> Option<ScannerPlane> {
        let in_range = |range: (i64, i64)| vol_id >= range.0 && vol_id <= range.1;
        if in_range(self.vert1_vol_ids) {
            Some(ScannerPlane::Vertical1)
        } else if in_range(self.vert2_vol_ids) {
            Some(ScannerPlane::Vertical2)
        } else if in_range(self.horiz1_vol_ids) {
            Some(ScannerPlane::Horizontal1)
        } else if in_range(self.horiz2_vol_ids) {
            Some(ScannerPlane::Horizontal2)
        } else {
            None
        }
    }

    /// The position domain of one plane's profile histogram, in mm.
    pub fn position_range(&self) -> (f64, f64) {
        let half = (self.wires_per_plane / 2) as f64 * self.wire_spacing_mm;
        (-half, half)
    }

    /// The wire positions of one plane, strictly ascending.
    pub fn wire_positions(&self) -> Vec<f64> {
        (0..self.wires_per_plane)
            .map(|wire| self.vol_id_to_position(wire))
            .collect()
    }
}

/// Find the index of the wire closest to a query position.
///
/// `wire_positions` must be strictly ascending. An exact hit returns that
/// wire's index; otherwise the insertion point found by binary search is
/// compared against its neighbor below, with a tie going to the lower index.
/// Queries outside the covered range are clamped to the nearest end wire.
pub fn closest_wire(position: f64, wire_positions: &[f64]) -> usize {
    if let Some(idx) = wire_positions.iter().position(|wire| *wire == position) {
        return idx;
    }
    let insertion = wire_positions.partition_point(|wire| *wire < position);
    if insertion == 0 {
        return 0;
    }
    if insertion == wire_positions.len() {
        return wire_positions.len() - 1;
    }
    let before = insertion - 1;
    let before_gap = (position - wire_positions[before]).abs();
    let after_gap = (wire_positions[insertion] - position).abs();
    if after_gap < before_gap {
        insertion
    } else {
        before
    }
}

/// A rigid placement of one virtual detector: a translation followed by a
/// rotation about the y axis, with an optional x flip for detectors whose
/// local frame is constructed rotated by 166 degrees rather than 14.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub angle_deg: f64,
    pub flip_x: bool,
}

impl FrameTransform {
    /// For a virtual detector flush with the upstream face of the production
    /// target. Offsets and angle come from the detector placement in the
    /// simulation geometry.
    pub const fn target_front() -> Self {
        Self {
            dx: -3930.6141,
            dy: 0.0,
            dz: 6177.7583,
            angle_deg: -14.0,
            flip_x: false,
        }
    }

    /// For a virtual detector flush with the downstream face of the
    /// production target.
    pub const fn target_back() -> Self {
        Self {
            dx: -3877.3898,
            dy: 0.0,
            dz: 6151.2429,
            angle_deg: -14.0,
            flip_x: false,
        }
    }

    /// The "local" coordinates of the PTM virtual detectors undergo a 166
    /// degree rotation, rather than a 14 degree rotation, because of how the
    /// PTM gets constructed. The global coordinates are correct but the local
    /// coordinates flip x and -x.
    pub const fn ptm_local() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            angle_deg: 0.0,
            flip_x: true,
        }
    }

    /// Apply the transform to a local position. Exact arithmetic only:
    /// translation, then a 2D rotation in the (x, z) plane; y is unchanged.
    pub fn apply(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let mut x = x + self.dx;
        let y = y + self.dy;
        let z = z + self.dz;
        if self.flip_x {
            x = -x;
        }
        let theta = self.angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        (x * cos + z * sin, y, -x * sin + z * cos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vol_id_position_mapping() {
        let geometry = ScannerGeometry::default();
        // Strictly increasing bijection on each 48-id block, -48..+46
        let mut last = f64::NEG_INFINITY;
        for vol_id in 0..48 {
            let position = geometry.vol_id_to_position(vol_id);
            assert_eq!(position, ((vol_id - 24) * 2) as f64);
            assert!(position > last);
            last = position;
        }
        assert_eq!(geometry.vol_id_to_position(0), -48.0);
        assert_eq!(geometry.vol_id_to_position(47), 46.0);
        // Each block maps identically
        assert_eq!(geometry.vol_id_to_position(48), -48.0);
        assert_eq!(geometry.vol_id_to_position(191), 46.0);
    }

    #[test]
    fn test_plane_assignment() {
        let geometry = ScannerGeometry::default();
        assert_eq!(geometry.plane_for(0), Some(ScannerPlane::Vertical1));
        assert_eq!(geometry.plane_for(47), Some(ScannerPlane::Vertical1));
        // Volume id 48 belongs to the second block, never the first
        assert_eq!(geometry.plane_for(48), Some(ScannerPlane::Horizontal1));
        assert_eq!(geometry.plane_for(96), Some(ScannerPlane::Vertical2));
        assert_eq!(geometry.plane_for(191), Some(ScannerPlane::Horizontal2));
        assert_eq!(geometry.plane_for(192), None);
        assert_eq!(geometry.plane_for(-1), None);
    }

    #[test]
    fn test_closest_wire() {
        let wires = ScannerGeometry::default().wire_positions();
        assert_eq!(wires.len(), 48);
        // An exact wire position returns that index
        assert_eq!(closest_wire(0.0, &wires), 24);
        assert_eq!(closest_wire(-48.0, &wires), 0);
        assert_eq!(closest_wire(46.0, &wires), 47);
        // Nearer neighbor wins
        assert_eq!(closest_wire(0.4, &wires), 24);
        assert_eq!(closest_wire(1.7, &wires), 25);
        // A tie goes to the lower index
        assert_eq!(closest_wire(1.0, &wires), 24);
        // Past the last wire must not panic
        assert_eq!(closest_wire(47.0, &wires), 47);
        assert_eq!(closest_wire(-50.0, &wires), 0);
    }

    #[test]
    fn test_target_front_transform_fixture() {
        let transform = FrameTransform::target_front();
        // The translation origin maps to the rotation-invariant axis point
        let (x, y, z) = transform.apply(3930.6141, 1.0, -6177.7583);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
        assert!(z.abs() < 1e-6);
        // One mm along x picks up the -14 degree rotation
        let (x, y, z) = transform.apply(3931.6141, 0.0, -6177.7583);
        assert!((x - 0.9702957263).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        assert!((z - 0.2419218956).abs() < 1e-6);
    }

    #[test]
    fn test_target_back_constants() {
        let transform = FrameTransform::target_back();
        let (x, y, z) = transform.apply(3877.3898, -2.5, -6151.2429);
        assert!(x.abs() < 1e-6);
        assert!((y + 2.5).abs() < 1e-6);
        assert!(z.abs() < 1e-6);
    }

    #[test]
    fn test_ptm_local_flips_x_only() {
        let transform = FrameTransform::ptm_local();
        let (x, y, z) = transform.apply(12.0, -3.0, 7.5);
        assert_eq!((x, y, z), (-12.0, -3.0, 7.5));
    }
}
