//! The mutable per-vehicle record.

use std::fmt;
use std::str::FromStr;

use gf_core::{GridPoint, TruckCode};

use crate::physics::{self, LoadModel};
use crate::FleetError;

// ── TruckStatus ───────────────────────────────────────────────────────────────

/// Operational status of a truck.
///
/// Only `Available ⇄ EnRoute` is driven by the engine's depot rule.  `Broken`
/// is set on fuel exhaustion or a breakdown; the maintenance states are
/// imposed by the solver and never overridden locally.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TruckStatus {
    #[default]
    Available,
    EnRoute,
    Broken,
    UnderMaintenance,
    UnderPreventiveMaintenance,
    UnderBreakdownMaintenance,
}

impl TruckStatus {
    /// Any of the three maintenance states.
    #[inline]
    pub fn is_maintenance(self) -> bool {
        matches!(
            self,
            TruckStatus::UnderMaintenance
                | TruckStatus::UnderPreventiveMaintenance
                | TruckStatus::UnderBreakdownMaintenance
        )
    }

    /// Neither broken nor in maintenance: counts toward fleet speed.
    #[inline]
    pub fn is_active(self) -> bool {
        !self.is_maintenance() && self != TruckStatus::Broken
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TruckStatus::Available                  => "AVAILABLE",
            TruckStatus::EnRoute                    => "EN_ROUTE",
            TruckStatus::Broken                     => "BROKEN",
            TruckStatus::UnderMaintenance           => "MAINTENANCE",
            TruckStatus::UnderPreventiveMaintenance => "PREVENTIVE_MAINTENANCE",
            TruckStatus::UnderBreakdownMaintenance  => "BREAKDOWN_MAINTENANCE",
        }
    }
}

impl fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruckStatus {
    type Err = FleetError;

    /// Accepts the canonical names plus the solver's Spanish spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "AVAILABLE" | "DISPONIBLE" => Ok(TruckStatus::Available),
            "EN_ROUTE" | "EN_RUTA" => Ok(TruckStatus::EnRoute),
            "BROKEN" | "AVERIADO" | "INMOVILIZADO" => Ok(TruckStatus::Broken),
            "MAINTENANCE" | "EN_MANTENIMIENTO" => Ok(TruckStatus::UnderMaintenance),
            "PREVENTIVE_MAINTENANCE" | "EN_MANTENIMIENTO_PREVENTIVO" => {
                Ok(TruckStatus::UnderPreventiveMaintenance)
            }
            "BREAKDOWN_MAINTENANCE" | "EN_MANTENIMIENTO_POR_AVERIA" => {
                Ok(TruckStatus::UnderBreakdownMaintenance)
            }
            _ => Err(FleetError::UnknownStatus(s.to_owned())),
        }
    }
}

// ── VehicleClass ──────────────────────────────────────────────────────────────

/// Vehicle class.  Each class has a fixed tare and tank/cargo size.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleClass {
    #[default]
    TA,
    TB,
    TC,
    TD,
}

/// Class defaults used when the solver does not supply a value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClassSpec {
    pub tare_t:         f64,
    pub max_cargo_m3:   f64,
    pub max_fuel_gal:   f64,
    pub speed_kmh:      f64,
    /// t·km per gallon.
    pub class_constant: f64,
}

impl VehicleClass {
    pub fn spec(self) -> ClassSpec {
        let (tare_t, max_cargo_m3) = match self {
            VehicleClass::TA => (2.5, 25.0),
            VehicleClass::TB => (2.0, 15.0),
            VehicleClass::TC => (1.5, 10.0),
            VehicleClass::TD => (1.0, 5.0),
        };
        ClassSpec {
            tare_t,
            max_cargo_m3,
            max_fuel_gal:   25.0,
            speed_kmh:      50.0,
            class_constant: 180.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::TA => "TA",
            VehicleClass::TB => "TB",
            VehicleClass::TC => "TC",
            VehicleClass::TD => "TD",
        }
    }
}

impl FromStr for VehicleClass {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TA" => Ok(VehicleClass::TA),
            "TB" => Ok(VehicleClass::TB),
            "TC" => Ok(VehicleClass::TC),
            "TD" => Ok(VehicleClass::TD),
            _ => Err(FleetError::UnknownClass(s.to_owned())),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Truck ─────────────────────────────────────────────────────────────────────

/// Quantities derived from cargo and fuel by [`Truck::refresh_derived`].
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Derived {
    pub load_t:     f64,
    pub combined_t: f64,
    pub range_km:   f64,
    /// Set when any input was non-finite on the last refresh.
    pub corrupted:  bool,
}

/// One truck of the active cycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Truck {
    pub code:           TruckCode,
    pub class:          VehicleClass,
    /// Node currently occupied.
    pub location:       GridPoint,
    /// Index into the assigned route; 0 = start.
    pub progress:       usize,
    pub status:         TruckStatus,
    pub cargo_m3:       f64,
    pub max_cargo_m3:   f64,
    pub fuel_gal:       f64,
    pub max_fuel_gal:   f64,
    pub tare_t:         f64,
    pub speed_kmh:      f64,
    pub class_constant: f64,
    pub derived:        Derived,
    /// Sticky: set once any refresh found corrupted input.  Views render
    /// the truck's gauges as `ERROR` while set.
    pub faulted:        bool,
}

impl Truck {
    /// A truck at `location` with class defaults, full tank and full cargo.
    pub fn new(code: TruckCode, class: VehicleClass, location: GridPoint) -> Self {
        let spec = class.spec();
        let mut truck = Self {
            code,
            class,
            location,
            progress:       0,
            status:         TruckStatus::Available,
            cargo_m3:       spec.max_cargo_m3,
            max_cargo_m3:   spec.max_cargo_m3,
            fuel_gal:       spec.max_fuel_gal,
            max_fuel_gal:   spec.max_fuel_gal,
            tare_t:         spec.tare_t,
            speed_kmh:      spec.speed_kmh,
            class_constant: spec.class_constant,
            derived:        Derived::default(),
            faulted:        false,
        };
        truck.refresh_derived(LoadModel::default());
        truck
    }

    /// Clamp cargo and fuel into their ranges, then recompute load weight,
    /// combined weight and range, in that order.
    ///
    /// Returns `true` if a value was non-finite and had to be replaced by 0.
    /// Out-of-range finite values are clamped without being flagged.
    pub fn refresh_derived(&mut self, model: LoadModel) -> bool {
        let mut corrupted = false;

        for (value, max) in [
            (&mut self.cargo_m3, self.max_cargo_m3),
            (&mut self.fuel_gal, self.max_fuel_gal),
        ] {
            if !value.is_finite() {
                *value = 0.0;
                corrupted = true;
            } else if max.is_finite() {
                *value = value.clamp(0.0, max.max(0.0));
            }
        }

        let load     = physics::load_weight(self.cargo_m3, model);
        let combined = physics::combined_weight(load.value, self.tare_t);
        let range    = physics::max_range(self.fuel_gal, self.class_constant, combined.value);
        corrupted |= load.clamped || combined.clamped || range.clamped;

        self.derived = Derived {
            load_t:     load.value,
            combined_t: combined.value,
            range_km:   range.value,
            corrupted,
        };
        self.faulted |= corrupted;
        corrupted
    }

    /// Gallons needed to move one grid unit with the current load.
    pub fn fuel_per_step(&self) -> f64 {
        physics::fuel_for_distance(self.derived.combined_t, 1.0, self.class_constant).value
    }

    /// Refill cargo and fuel to maximum.
    pub fn recharge(&mut self) {
        self.cargo_m3 = self.max_cargo_m3;
        self.fuel_gal = self.max_fuel_gal;
    }

    /// Cargo as a fraction of capacity, `None` when not computable.
    pub fn cargo_ratio(&self) -> Option<f64> {
        ratio(self.cargo_m3, self.max_cargo_m3)
    }

    /// Fuel as a fraction of tank size, `None` when not computable.
    pub fn fuel_ratio(&self) -> Option<f64> {
        ratio(self.fuel_gal, self.max_fuel_gal)
    }

    /// A placeholder for a truck referenced by a route but missing from the
    /// solution: parked at `depot`, broken, empty.
    pub fn synthesized(code: TruckCode, depot: GridPoint) -> Self {
        let class = code
            .class_prefix()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default();
        let mut truck = Truck::new(code, class, depot);
        truck.status = TruckStatus::Broken;
        truck.cargo_m3 = 0.0;
        truck.fuel_gal = 0.0;
        truck.refresh_derived(LoadModel::default());
        truck
    }
}

pub(crate) fn ratio(current: f64, max: f64) -> Option<f64> {
    if current.is_finite() && max.is_finite() && max > 0.0 {
        Some((current / max).clamp(0.0, 1.0))
    } else {
        None
    }
}
