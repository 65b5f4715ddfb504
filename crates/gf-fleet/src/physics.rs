//! Truck physical model.
//!
//! Four pure functions, always evaluated in this order after any cargo or
//! fuel change:
//!
//! ```text
//! load_t      = cargo_m3 * tonnes_per_m3
//! combined_t  = load_t + tare_t
//! fuel_gal(d) = combined_t * d / k          (k: class constant, t·km/gal)
//! range_km    = fuel_gal * k / combined_t
//! ```
//!
//! Inputs are never legitimately negative or non-finite.  When one is, the
//! function returns `0.0` with [`Checked::clamped`] set instead of letting
//! NaN flow down the chain.

/// A computed quantity plus whether an input had to be clamped.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Checked {
    pub value:   f64,
    pub clamped: bool,
}

impl Checked {
    #[inline]
    fn ok(value: f64) -> Self {
        Self { value, clamped: false }
    }

    #[inline]
    fn clamped() -> Self {
        Self { value: 0.0, clamped: true }
    }
}

/// Volume-to-weight conversion shared by every truck.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LoadModel {
    pub tonnes_per_m3: f64,
}

impl Default for LoadModel {
    fn default() -> Self {
        Self { tonnes_per_m3: 0.5 }
    }
}

#[inline]
fn valid(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

/// Weight of the gas on board, tonnes.
pub fn load_weight(cargo_m3: f64, model: LoadModel) -> Checked {
    if !valid(cargo_m3) || !valid(model.tonnes_per_m3) {
        return Checked::clamped();
    }
    Checked::ok(cargo_m3 * model.tonnes_per_m3)
}

/// Load plus tare, tonnes.
pub fn combined_weight(load_t: f64, tare_t: f64) -> Checked {
    if !valid(load_t) || !valid(tare_t) {
        return Checked::clamped();
    }
    Checked::ok(load_t + tare_t)
}

/// Gallons burnt to cover `distance_km` at `combined_t`.
pub fn fuel_for_distance(combined_t: f64, distance_km: f64, class_constant: f64) -> Checked {
    if !valid(combined_t) || !valid(distance_km) || !valid(class_constant) || class_constant == 0.0 {
        return Checked::clamped();
    }
    Checked::ok(combined_t * distance_km / class_constant)
}

/// Kilometres the remaining fuel can cover at `combined_t`.
pub fn max_range(fuel_gal: f64, class_constant: f64, combined_t: f64) -> Checked {
    if !valid(fuel_gal) || !valid(class_constant) || !valid(combined_t) || combined_t == 0.0 {
        return Checked::clamped();
    }
    Checked::ok(fuel_gal * class_constant / combined_t)
}
