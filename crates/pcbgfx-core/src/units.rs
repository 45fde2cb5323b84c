//! Board internal units. One internal unit is one nanometre.

pub const IU_PER_MM: f64 = 1e6;
pub const IU_PER_MILS: f64 = IU_PER_MM * 0.0254;
pub const MM_PER_IU: f64 = 1.0 / IU_PER_MM;

pub fn mm_to_iu(mm: f64) -> i32 {
    crate::geometry::ki_round(mm * IU_PER_MM)
}

pub fn mils_to_iu(mils: f64) -> i32 {
    crate::geometry::ki_round(mils * IU_PER_MILS)
}

pub fn iu_to_mm(iu: f64) -> f64 {
    iu * MM_PER_IU
}

/// Tenths of a degree to radians.
pub fn decideg_to_rad(decideg: f64) -> f64 {
    (decideg / 10.0).to_radians()
}
