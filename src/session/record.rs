//! Dictionary form of session objects.
//!
//! A [`Record`] is the serde-facing snapshot of one object tree. The `@class`
//! key names the kind of object and `@id` carries the handle it had when the
//! record was taken. Restoring a record always registers new objects with
//! fresh handles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::graph::Id;
use crate::variables::{Bounds, Object, Parameter, ValueCell};

use super::Session;

fn default_enabled() -> bool {
    true
}

/// Plain fields shared by value cells and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A parameter; `min`/`max` sit beside the cell fields and `null` is
/// unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    #[serde(flatten)]
    pub cell: CellRecord,
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default)]
    pub error: f64,
    #[serde(default)]
    pub fixed: bool,
}

/// A composite with its fields nested in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub fields: IndexMap<String, Record>,
}

/// Serializable snapshot of an object tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@class")]
pub enum Record {
    ValueCell(CellRecord),
    Parameter(ParameterRecord),
    Composite(CompositeRecord),
}

impl CellRecord {
    fn of(id: Id, cell: &ValueCell) -> Self {
        Self {
            id: Some(id.to_string()),
            name: cell.name.clone(),
            value: cell.magnitude,
            units: cell.unit.symbol().to_string(),
            description: cell.description.clone(),
            url: cell.url.clone(),
            display_name: cell.display_name.clone(),
            enabled: cell.enabled,
        }
    }

    fn build(&self) -> Result<ValueCell> {
        let mut cell = ValueCell::new(&self.name, self.value)
            .with_unit(&self.units)?
            .with_description(&self.description)
            .with_url(&self.url)
            .with_enabled(self.enabled);
        if let Some(display_name) = &self.display_name {
            cell = cell.with_display_name(display_name);
        }
        Ok(cell)
    }
}

impl ParameterRecord {
    fn build(&self) -> Result<Parameter> {
        if !self.cell.value.is_finite() {
            return Err(CoreError::value(format!(
                "value of '{}' must be finite",
                self.cell.name
            )));
        }
        let mut param = Parameter::with_bounds(
            &self.cell.name,
            self.cell.value,
            self.bounds.min,
            self.bounds.max,
        )?
        .with_error(self.error)?
        .with_fixed(self.fixed);
        param.cell = self.cell.build()?;
        Ok(param)
    }
}

impl Session {
    /// Snapshot an object tree.
    pub fn record(&self, id: Id) -> Result<Record> {
        Ok(match self.get_item_by_key(id)? {
            Object::Cell(cell) => Record::ValueCell(CellRecord::of(id, cell)),
            Object::Parameter(param) => Record::Parameter(ParameterRecord {
                cell: CellRecord::of(id, &param.cell),
                bounds: param.bounds,
                error: param.error,
                fixed: param.fixed,
            }),
            Object::Composite(composite) => {
                let mut fields = IndexMap::with_capacity(composite.len());
                for (field, child) in composite.fields() {
                    fields.insert(field.to_string(), self.record(child)?);
                }
                Record::Composite(CompositeRecord {
                    id: Some(id.to_string()),
                    name: composite.name.clone(),
                    fields,
                })
            }
        })
    }

    /// Dictionary form of an object tree
    ///
    /// # Examples
    ///
    /// ```
    /// use modelcore_rs::session::Session;
    /// use modelcore_rs::variables::Parameter;
    ///
    /// let mut session = Session::new();
    /// let p = session
    ///     .add_parameter(Parameter::with_bounds("p", 1.0, 0.0, f64::INFINITY).unwrap(), None)
    ///     .unwrap();
    ///
    /// let dict = session.as_dict(p).unwrap();
    /// assert_eq!(dict["@class"], "Parameter");
    /// assert_eq!(dict["min"], 0.0);
    /// assert!(dict["max"].is_null());
    ///
    /// let copy = session.from_dict(&dict).unwrap();
    /// assert_ne!(copy, p);
    /// assert_eq!(session.parameter(copy).unwrap().max(), f64::INFINITY);
    /// ```
    pub fn as_dict(&self, id: Id) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.record(id)?)?)
    }

    /// Register new objects from a dictionary produced by [`as_dict`](Self::as_dict).
    pub fn from_dict(&mut self, dict: &serde_json::Value) -> Result<Id> {
        let record: Record = serde_json::from_value(dict.clone())?;
        self.restore(&record)
    }

    pub fn to_json(&self, id: Id) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.record(id)?)?)
    }

    pub fn from_json(&mut self, json: &str) -> Result<Id> {
        let record: Record = serde_json::from_str(json)?;
        self.restore(&record)
    }

    /// Register the objects of a record. Nothing stays registered on failure.
    pub fn restore(&mut self, record: &Record) -> Result<Id> {
        match record {
            Record::ValueCell(cell) => self.add_cell(cell.build()?, None),
            Record::Parameter(param) => self.add_parameter(param.build()?, None),
            Record::Composite(composite) => {
                let mut created: Vec<(&str, Id)> = Vec::with_capacity(composite.fields.len());
                for (field, child) in &composite.fields {
                    match self.restore(child) {
                        Ok(id) => created.push((field.as_str(), id)),
                        Err(e) => {
                            for (_, id) in created {
                                self.release(id)?;
                            }
                            return Err(e);
                        }
                    }
                }
                self.add_composite(&composite.name, &created)
            }
        }
    }
}
