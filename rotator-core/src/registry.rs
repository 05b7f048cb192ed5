//! Device Registry
//!
//! Client-side mirror of every rotator the hub knows about, plus the
//! rotator currently shown on each compass.
//!
//! Selection invariant: a selection is either `None` or names a present
//! record that supports the axis. Every mutation restores it before
//! returning.

use std::collections::BTreeMap;

use crate::axis::Axis;
use crate::error::RegistryError;
use crate::rotator::{HeadingUpdate, RotatorRecord};

/// Name-keyed set of rotators with one selection per axis
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    /// Records by name (BTreeMap keeps reselection deterministic)
    devices: BTreeMap<String, RotatorRecord>,
    selected_azimuth: Option<String>,
    selected_elevation: Option<String>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Insert a record unless one with the same name is already present.
    ///
    /// Returns true when the record was inserted. A new record is selected on
    /// every axis it supports that has no selection yet.
    pub fn add(&mut self, record: RotatorRecord) -> bool {
        if self.devices.contains_key(&record.name) {
            return false;
        }
        for axis in Axis::ALL {
            if record.supports(axis) && self.selection(axis).is_none() {
                *self.selection_mut(axis) = Some(record.name.clone());
            }
        }
        self.devices.insert(record.name.clone(), record);
        true
    }

    /// Remove a record, moving any selection it held to the first eligible
    /// remaining rotator by name.
    pub fn remove(&mut self, name: &str) -> Option<RotatorRecord> {
        let removed = self.devices.remove(name)?;
        for axis in Axis::ALL {
            if self.selection(axis).as_deref() == Some(name) {
                let next = self.first_eligible(axis);
                *self.selection_mut(axis) = next;
            }
        }
        Some(removed)
    }

    /// Merge a partial heading into a present record.
    ///
    /// Returns true when the record exists and a value changed.
    pub fn update_heading(&mut self, name: &str, update: &HeadingUpdate) -> bool {
        match self.devices.get_mut(name) {
            Some(record) => record.apply(update),
            None => false,
        }
    }

    /// Drop every record and both selections, returning how many were dropped
    pub fn reset(&mut self) -> usize {
        let dropped = self.devices.len();
        self.devices.clear();
        self.selected_azimuth = None;
        self.selected_elevation = None;
        dropped
    }

    /// Show a specific rotator on an axis
    pub fn select(&mut self, axis: Axis, name: &str) -> Result<(), RegistryError> {
        let record = self
            .devices
            .get(name)
            .ok_or_else(|| RegistryError::UnknownRotator(name.to_string()))?;
        if !record.supports(axis) {
            return Err(RegistryError::Unsupported {
                name: name.to_string(),
                axis,
            });
        }
        *self.selection_mut(axis) = Some(name.to_string());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&RotatorRecord> {
        self.devices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Name of the rotator shown on an axis
    pub fn selected(&self, axis: Axis) -> Option<&str> {
        self.selection(axis).as_deref()
    }

    pub fn selected_record(&self, axis: Axis) -> Option<&RotatorRecord> {
        self.selected(axis).and_then(|name| self.devices.get(name))
    }

    /// Records supporting an axis, in no particular order
    pub fn by_capability(&self, axis: Axis) -> Vec<&RotatorRecord> {
        self.devices.values().filter(|r| r.supports(axis)).collect()
    }

    /// All records in no particular order
    pub fn all(&self) -> Vec<&RotatorRecord> {
        self.devices.values().collect()
    }

    fn first_eligible(&self, axis: Axis) -> Option<String> {
        self.devices
            .values()
            .find(|r| r.supports(axis))
            .map(|r| r.name.clone())
    }

    fn selection(&self, axis: Axis) -> &Option<String> {
        match axis {
            Axis::Azimuth => &self.selected_azimuth,
            Axis::Elevation => &self.selected_elevation,
        }
    }

    fn selection_mut(&mut self, axis: Axis) -> &mut Option<String> {
        match axis {
            Axis::Azimuth => &mut self.selected_azimuth,
            Axis::Elevation => &mut self.selected_elevation,
        }
    }
}

/// Sort a view by name
pub fn sorted_by_name(mut view: Vec<&RotatorRecord>) -> Vec<&RotatorRecord> {
    view.sort_by(|a, b| a.name.cmp(&b.name));
    view
}
