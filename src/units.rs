//! Physical constants in the unit system of the finder.
//!
//! Positions are comoving Mpc, velocities km/s, masses M_sun. Energies
//! come out in M_sun km^2 s^-2 once gravitational terms are converted
//! with [`KILOMETERS_PER_MEGAPARSEC`].

/// Newton's constant in km^3 M_sun^-1 s^-2.
pub const GRAVITATIONAL_CONSTANT: f64 = 1.32712442099e11;

/// Conversion factor between the Mpc positions and the km used by
/// velocities and the gravitational constant.
pub const KILOMETERS_PER_MEGAPARSEC: f64 = 3.086e19;

/// Snapshot particle masses arrive in units of 10^10 M_sun / h.
pub const SOLAR_MASSES_PER_MASS_UNIT: f64 = 1e10;
