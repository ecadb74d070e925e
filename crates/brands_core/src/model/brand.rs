//! Brand domain model and request payload shapes.
//!
//! # Responsibility
//! - Define the canonical `Brand` record returned to callers.
//! - Define create/update payloads and their field-level validation.
//! - Define list query/page envelopes.
//!
//! # Invariants
//! - `id` is stable and never reused for another brand.
//! - `status` is always one of `active|inactive|draft`.
//! - `NewBrand` and `BrandPatch` only exist as results of validation.
//! - Validation reports every offending field, not just the first one.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a brand record.
pub type BrandId = Uuid;

/// Minimum accepted length (in chars) for `name` and `holder`.
pub const TEXT_FIELD_MIN_CHARS: usize = 2;
/// Maximum accepted length (in chars) for `name` and `holder`.
pub const TEXT_FIELD_MAX_CHARS: usize = 120;

/// Closed set of brand lifecycle states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandStatus {
    #[default]
    Active,
    Inactive,
    Draft,
}

const BRAND_STATUS_VALUES: &[&str] = &["active", "inactive", "draft"];

impl BrandStatus {
    /// Stable string id used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Draft => "draft",
        }
    }

    /// Parses an exact status string. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }

    /// All accepted status strings, in declaration order.
    pub fn allowed_values() -> &'static [&'static str] {
        BRAND_STATUS_VALUES
    }
}

impl Display for BrandStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brand record as persisted and returned to callers.
///
/// Built from trusted storage rows without re-running payload validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub holder: Option<String>,
    pub status: BrandStatus,
    /// Unix epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
}

/// Raw create payload as received from callers.
///
/// Every field is optional at the wire level so that missing or invalid
/// values are reported together by [`CreateBrandInput::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateBrandInput {
    pub name: Option<String>,
    pub holder: Option<String>,
    pub status: Option<String>,
}

impl CreateBrandInput {
    /// Reads a create payload from a decoded JSON object.
    ///
    /// Fields of the wrong JSON type are reported as `invalid_type` together
    /// with every rule violation of the remaining fields. Unknown keys are
    /// ignored.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, BrandValidationError> {
        let mut reader = JsonFieldReader::new(body);
        let input = Self {
            name: reader.text("name"),
            holder: reader.text("holder"),
            status: reader.text("status"),
        };
        reader.finish(input, Self::validate)
    }

    /// Validates the payload and produces an insertable brand.
    ///
    /// # Errors
    /// - Returns every violation found across `name`, `holder` and `status`.
    pub fn validate(&self) -> Result<NewBrand, BrandValidationError> {
        let mut violations = Vec::new();

        let name = match self.name.as_deref() {
            Some(raw) => check_text_field("name", raw, &mut violations),
            None => {
                violations.push(FieldViolation::new("name", FieldConstraint::Required));
                None
            }
        };
        let holder = self
            .holder
            .as_deref()
            .and_then(|raw| check_text_field("holder", raw, &mut violations));
        let status = match self.status.as_deref() {
            Some(raw) => check_status_field(raw, &mut violations),
            None => Some(BrandStatus::default()),
        };

        if !violations.is_empty() {
            return Err(BrandValidationError::new(violations));
        }

        match (name, status) {
            (Some(name), Some(status)) => Ok(NewBrand {
                name,
                holder,
                status,
            }),
            _ => Err(BrandValidationError::new(violations)),
        }
    }
}

/// Raw partial-update payload as received from callers.
///
/// Absent (or `null`) fields mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateBrandInput {
    pub name: Option<String>,
    pub holder: Option<String>,
    pub status: Option<String>,
}

impl UpdateBrandInput {
    /// Reads an update payload from a decoded JSON object. See
    /// [`CreateBrandInput::from_json`].
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, BrandValidationError> {
        let mut reader = JsonFieldReader::new(body);
        let input = Self {
            name: reader.text("name"),
            holder: reader.text("holder"),
            status: reader.text("status"),
        };
        reader.finish(input, Self::validate)
    }

    /// Validates the supplied fields and produces a patch.
    ///
    /// # Errors
    /// - Returns every violation found across the supplied fields.
    pub fn validate(&self) -> Result<BrandPatch, BrandValidationError> {
        let mut violations = Vec::new();

        let name = self
            .name
            .as_deref()
            .and_then(|raw| check_text_field("name", raw, &mut violations));
        let holder = self
            .holder
            .as_deref()
            .and_then(|raw| check_text_field("holder", raw, &mut violations));
        let status = self
            .status
            .as_deref()
            .and_then(|raw| check_status_field(raw, &mut violations));

        if !violations.is_empty() {
            return Err(BrandValidationError::new(violations));
        }

        Ok(BrandPatch {
            name,
            holder,
            status,
        })
    }
}

/// Validated brand ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBrand {
    name: String,
    holder: Option<String>,
    status: BrandStatus,
}

impl NewBrand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    pub fn status(&self) -> BrandStatus {
        self.status
    }
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandPatch {
    name: Option<String>,
    holder: Option<String>,
    status: Option<BrandStatus>,
}

impl BrandPatch {
    /// Returns whether the patch supplies no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.holder.is_none() && self.status.is_none()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    pub fn status(&self) -> Option<BrandStatus> {
        self.status
    }

    /// Returns `current` with the supplied fields applied.
    ///
    /// Timestamps are copied unchanged; storage owns them.
    pub fn apply_to(&self, current: &Brand) -> Brand {
        Brand {
            id: current.id,
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            holder: self.holder.clone().or_else(|| current.holder.clone()),
            status: self.status.unwrap_or(current.status),
            created_at: current.created_at,
            updated_at: current.updated_at,
        }
    }
}

/// List query as received from callers, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BrandListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Case-insensitive substring filter on `name`.
    pub q: Option<String>,
}

/// Paginated list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandPage {
    /// Number of brands matching the filter, ignoring limit/offset.
    pub total: u64,
    pub items: Vec<Brand>,
}

/// Constraint violated by one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldConstraint {
    Required,
    /// JSON value of the wrong type (e.g. a number where text is expected).
    InvalidType { expected: &'static str },
    TooShort { min: usize },
    TooLong { max: usize },
    NotOneOf { allowed: &'static [&'static str] },
}

impl FieldConstraint {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidType { .. } => "invalid_type",
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
            Self::NotOneOf { .. } => "not_one_of",
        }
    }
}

impl Display for FieldConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "field is required"),
            Self::InvalidType { expected } => write!(f, "must be a {expected}"),
            Self::TooShort { min } => write!(f, "must be at least {min} characters"),
            Self::TooLong { max } => write!(f, "must be at most {max} characters"),
            Self::NotOneOf { allowed } => write!(f, "must be one of {}", allowed.join("|")),
        }
    }
}

/// One offending field and the constraint it violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub constraint: FieldConstraint,
}

impl FieldViolation {
    pub fn new(field: &'static str, constraint: FieldConstraint) -> Self {
        Self { field, constraint }
    }
}

impl Display for FieldViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl Serialize for FieldViolation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FieldViolation", 3)?;
        state.serialize_field("field", self.field)?;
        state.serialize_field("code", self.constraint.code())?;
        state.serialize_field("message", &self.constraint.to_string())?;
        state.end()
    }
}

/// Payload validation failure listing every violated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandValidationError {
    violations: Vec<FieldViolation>,
}

impl BrandValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns whether any violation targets `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|item| item.field == field)
    }
}

impl Display for BrandValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid brand payload: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Error for BrandValidationError {}

/// Lenient field reader over a JSON object. `null` and absent keys read as
/// `None`; other non-string values are recorded as type violations.
struct JsonFieldReader<'a> {
    body: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> JsonFieldReader<'a> {
    fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            violations: Vec::new(),
        }
    }

    fn text(&mut self, field: &'static str) -> Option<String> {
        match self.body.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                self.violations.push(FieldViolation::new(
                    field,
                    FieldConstraint::InvalidType { expected: "string" },
                ));
                None
            }
        }
    }

    /// Returns `input` when every field had the right type. Otherwise the
    /// type violations are merged with the rule violations of the other
    /// fields, in field order.
    fn finish<T, U>(
        self,
        input: T,
        validate: impl FnOnce(&T) -> Result<U, BrandValidationError>,
    ) -> Result<T, BrandValidationError> {
        if self.violations.is_empty() {
            return Ok(input);
        }

        let mut violations = self.violations;
        if let Err(rules) = validate(&input) {
            let untyped: Vec<FieldViolation> = rules
                .violations
                .into_iter()
                .filter(|rule| !violations.iter().any(|typed| typed.field == rule.field))
                .collect();
            violations.extend(untyped);
        }
        violations.sort_by_key(|violation| field_rank(violation.field));
        Err(BrandValidationError::new(violations))
    }
}

fn field_rank(field: &str) -> usize {
    ["name", "holder", "status"]
        .iter()
        .position(|known| *known == field)
        .unwrap_or(usize::MAX)
}

fn check_text_field(
    field: &'static str,
    raw: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if chars < TEXT_FIELD_MIN_CHARS {
        violations.push(FieldViolation::new(
            field,
            FieldConstraint::TooShort {
                min: TEXT_FIELD_MIN_CHARS,
            },
        ));
        return None;
    }
    if chars > TEXT_FIELD_MAX_CHARS {
        violations.push(FieldViolation::new(
            field,
            FieldConstraint::TooLong {
                max: TEXT_FIELD_MAX_CHARS,
            },
        ));
        return None;
    }
    Some(trimmed.to_string())
}

fn check_status_field(raw: &str, violations: &mut Vec<FieldViolation>) -> Option<BrandStatus> {
    let parsed = BrandStatus::parse(raw.trim());
    if parsed.is_none() {
        violations.push(FieldViolation::new(
            "status",
            FieldConstraint::NotOneOf {
                allowed: BrandStatus::allowed_values(),
            },
        ));
    }
    parsed
}
