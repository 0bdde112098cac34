//! Typed schema models
//!
//! Strongly typed form of one IDD object type: a header describing the
//! type itself plus its ordered field definitions. Construction goes
//! through the normalization rules in [`crate::normalize`]; the raw
//! attribute sets are closed, so an unknown attribute key is rejected
//! rather than ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::normalize::{self, NormalizeError};

/// Header attributes of one object type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectHeader {
    /// Group the type belongs to (e.g. "Thermal Zones and Surfaces")
    pub group: String,
    /// Human-readable description, joined from its source lines
    pub memo: Option<String>,
    /// Display format hint
    pub format: Option<String>,
    /// Minimum number of fields an instance must carry
    pub min_fields: Option<String>,
    /// Obsoletion note, present when the type is deprecated
    pub obsolete: Option<String>,
    /// At most one instance of this type may exist per model
    pub unique_object: bool,
    /// Every model must contain at least one instance
    pub required_object: bool,
    /// Zero-based index of the last fixed field before the repeating
    /// field block begins; `None` when the type is not extensible
    pub extensible: Option<usize>,
}

impl ObjectHeader {
    /// Build a header from the generic header attributes of a type block.
    ///
    /// The `extensible:N` marker keys must already be partitioned out by
    /// the caller; `type_name` is only used for error context.
    pub(crate) fn from_raw(type_name: &str, attrs: &Map<String, Value>) -> Result<Self> {
        let mut header = ObjectHeader::default();
        let mut group = None;
        let attach = |key: &str, e: NormalizeError| {
            SchemaError::validation(type_name, format!("{key}: {e}"))
        };

        for (key, value) in attrs {
            match key.as_str() {
                // Self-declared type name, consumed by the registry
                "idfobj" => {}
                "group" => group = Some(normalize::singleton(value).map_err(|e| attach(key, e))?),
                "memo" => header.memo = Some(normalize::joined(value).map_err(|e| attach(key, e))?),
                "format" => {
                    header.format = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "min-fields" => {
                    header.min_fields =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "obsolete" => {
                    header.obsolete = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "unique-object" => {
                    header.unique_object = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "required-object" => {
                    header.required_object = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                other => {
                    return Err(SchemaError::validation(
                        type_name,
                        format!("unknown header attribute '{other}'"),
                    ))
                }
            }
        }

        header.group = group.ok_or_else(|| {
            SchemaError::validation(type_name, "missing required header attribute 'group'")
        })?;

        Ok(header)
    }
}

/// One field slot within an object type definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name, the label instance values line up against
    pub name: String,
    /// Free-text type tag ("alpha", "real", "object-list", ...)
    pub field_type: Option<String>,
    /// Documentation note, joined from its source lines
    pub note: Option<String>,
    /// Default value as written in the dictionary
    pub default: Option<String>,
    /// Closed set of allowed literal values, when choice-constrained
    pub keys: Vec<String>,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    /// Exclusive bound variants (`minimum>` / `maximum<`)
    pub minimum_strict: Option<String>,
    pub maximum_strict: Option<String>,
    pub units: Option<String>,
    /// Units in the inch-pound system
    pub ip_units: Option<String>,
    /// Name of the field whose value selects this field's units
    pub units_based_on_field: Option<String>,
    pub external_list: Option<String>,
    pub retain_case: bool,
    pub required: bool,
    /// Marks the first field of the repeating block
    pub begins_extensible: bool,
    pub autosizable: bool,
    pub autocalculatable: bool,
    /// Reference tags this field defines; other fields' object-lists
    /// point at these tags (definition site)
    pub reference: Vec<String>,
    pub reference_class_name: Vec<String>,
    /// Reference tags this field points at (reference site)
    pub object_list: Vec<String>,
    /// Resolved concrete type names this field may reference
    pub valid_objects: Vec<String>,
}

impl FieldSchema {
    /// True when this field is a reference site with resolved targets
    pub fn is_reference(&self) -> bool {
        !self.valid_objects.is_empty()
    }

    /// Build a field definition from one field entry of a type block
    pub(crate) fn from_raw(type_name: &str, attrs: &Map<String, Value>) -> Result<Self> {
        let mut field = FieldSchema::default();
        field.name = match attrs.get("field") {
            Some(v) => normalize::singleton(v)
                .map_err(|e| SchemaError::field_validation(type_name, "field", e.to_string()))?,
            None => {
                return Err(SchemaError::validation(
                    type_name,
                    "field entry is missing its 'field' attribute",
                ))
            }
        };
        let field_name = field.name.clone();
        let attach = move |key: &str, e: NormalizeError| {
            SchemaError::field_validation(type_name, &field_name, format!("{key}: {e}"))
        };

        for (key, value) in attrs {
            match key.as_str() {
                "field" => {}
                "type" => {
                    field.field_type =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "note" => field.note = Some(normalize::joined(value).map_err(|e| attach(key, e))?),
                "default" => {
                    field.default = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "key" => field.keys = normalize::string_list(value).map_err(|e| attach(key, e))?,
                "minimum" => {
                    field.minimum = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "maximum" => {
                    field.maximum = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "minimum>" => {
                    field.minimum_strict =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "maximum<" => {
                    field.maximum_strict =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "units" => {
                    field.units = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "ip-units" => {
                    field.ip_units = Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "unitsbasedonfield" => {
                    field.units_based_on_field =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "external-list" => {
                    field.external_list =
                        Some(normalize::singleton(value).map_err(|e| attach(key, e))?)
                }
                "retaincase" => {
                    field.retain_case = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "required-field" => {
                    field.required = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "begin-extensible" => {
                    field.begins_extensible = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "autosizable" => {
                    field.autosizable = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "autocalculatable" => {
                    field.autocalculatable = normalize::flag(value).map_err(|e| attach(key, e))?
                }
                "reference" => {
                    field.reference = normalize::string_list(value).map_err(|e| attach(key, e))?
                }
                "reference-class-name" => {
                    field.reference_class_name =
                        normalize::string_list(value).map_err(|e| attach(key, e))?
                }
                "object-list" => {
                    field.object_list = normalize::string_list(value).map_err(|e| attach(key, e))?
                }
                "validobjects" => {
                    field.valid_objects =
                        normalize::string_list(value).map_err(|e| attach(key, e))?
                }
                other => {
                    return Err(SchemaError::field_validation(
                        type_name,
                        &field.name,
                        format!("unknown field attribute '{other}'"),
                    ))
                }
            }
        }

        Ok(field)
    }
}

/// One object type definition: header plus ordered field definitions.
///
/// Field order is load-bearing: position determines which raw instance
/// value lines up with which field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Unique, upper-cased type name
    pub type_name: String,
    pub header: ObjectHeader,
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(type_name: impl Into<String>, header: ObjectHeader) -> Self {
        Self {
            type_name: type_name.into().to_uppercase(),
            header,
            fields: Vec::new(),
        }
    }

    /// Append a field definition, preserving order.
    ///
    /// A second field with the same name within one type is a
    /// validation failure.
    pub fn push_field(&mut self, field: FieldSchema) -> Result<()> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(SchemaError::field_validation(
                &self.type_name,
                &field.name,
                "duplicate field name within one type",
            ));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Look up a field definition by name
    pub fn field(&self, name: &str) -> Result<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SchemaError::FieldNotFound {
                type_name: self.type_name.clone(),
                field: name.to_string(),
                available: self
                    .fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Iterate field definitions in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The last fixed field before the repeating block, when extensible
    pub fn extensible_field(&self) -> Option<&FieldSchema> {
        self.header.extensible.and_then(|i| self.fields.get(i))
    }
}
