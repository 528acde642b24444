use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Member id used for records that were never attributed to a member.
pub const UNASSIGNED_MEMBER: &str = "unassigned";
pub const UNKNOWN_FILE_NAME: &str = "Unknown File";
pub const UNKNOWN_FILE_TYPE: &str = "unknown";
pub const UNKNOWN_DOCTOR_NAME: &str = "Unknown Doctor";
pub const UNKNOWN_FIELD: &str = "Unknown";
pub const DEFAULT_UPLOAD_TYPE: &str = "application/octet-stream";
pub const SELF_PROFILE_NAME: &str = "My Profile";

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Content-addressed identifier issued by the upload gateway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Wallet or contract address.
///
/// The original casing is kept for display, while equality and hashing are
/// ASCII case-insensitive so chain checksummed addresses match the
/// lower-cased keys used by the metadata store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for metadata paths and lookups.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// Display-ready record: chain existence joined with store metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub cid: ContentHash,
    pub member_id: String,
    pub file_name: String,
    pub file_type: String,
    /// Milliseconds since the UNIX epoch.
    pub uploaded_at: u64,
    pub description: String,
}

/// Metadata document stored under `users/{account}/records/{cid}`.
///
/// Every field is optional; defaults are applied when merging. A field of
/// the wrong JSON type reads as absent without discarding its siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordMeta {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_cid")]
    pub cid: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_millis")]
    pub uploaded_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

// ── Members ──────────────────────────────────────────────────────────────────

/// Relation of a member to the account holder.
///
/// Only the exact string `"Self"` parses to [`Relation::Myself`]; strings
/// outside the known set are preserved in [`Relation::Custom`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relation {
    Myself,
    Spouse,
    Child,
    Parent,
    Sibling,
    Other,
    Custom(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Relation::Myself => "Self",
            Relation::Spouse => "Spouse",
            Relation::Child => "Child",
            Relation::Parent => "Parent",
            Relation::Sibling => "Sibling",
            Relation::Other => "Other",
            Relation::Custom(s) => s,
        }
    }

    pub fn is_self(&self) -> bool {
        matches!(self, Relation::Myself)
    }
}

impl Default for Relation {
    fn default() -> Self {
        Relation::Custom(String::new())
    }
}

impl From<String> for Relation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Self" => Relation::Myself,
            "Spouse" => Relation::Spouse,
            "Child" => Relation::Child,
            "Parent" => Relation::Parent,
            "Sibling" => Relation::Sibling,
            "Other" => Relation::Other,
            _ => Relation::Custom(value),
        }
    }
}

impl From<&str> for Relation {
    fn from(value: &str) -> Self {
        Relation::from(value.to_string())
    }
}

impl From<Relation> for String {
    fn from(value: Relation) -> Self {
        match value {
            Relation::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A profile records can be attributed to: the account holder or a dependent.
///
/// `id` is the store key and is never part of the stored document. Fields
/// of the wrong JSON type decode to their defaults rather than failing the
/// whole member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(skip)]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_relation")]
    pub relation: Relation,
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_created_at")]
    pub created_at: u64,
}

impl Member {
    /// The profile auto-created for an account without a Self member.
    pub fn default_self(now: u64) -> Self {
        Self {
            id: String::new(),
            name: SELF_PROFILE_NAME.to_string(),
            relation: Relation::Myself,
            age: String::new(),
            location: String::new(),
            created_at: now,
        }
    }
}

/// Form input for a new member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub relation: String,
    pub age: String,
    pub location: String,
}

/// Partial in-place edit of a member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ── Doctors ──────────────────────────────────────────────────────────────────

/// Admin verification status of a doctor application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    Pending,
    Verified,
    Rejected,
}

impl DoctorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorStatus::Pending => "pending",
            DoctorStatus::Verified => "verified",
            DoctorStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(DoctorStatus::Pending),
            "verified" => Some(DoctorStatus::Verified),
            "rejected" => Some(DoctorStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Doctor profile document stored under `doctors/{address}`. Mistyped
/// fields read as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorMeta {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub hospital: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub wallet_address: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_status"
    )]
    pub status: Option<DoctorStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

/// An application as listed for the admin: store key plus document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorApplication {
    pub id: String,
    pub meta: DoctorMeta,
}

impl DoctorApplication {
    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or(UNKNOWN_DOCTOR_NAME)
    }
}

/// Form input for a doctor's application or profile edit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub name: String,
    pub profession: String,
    pub hospital: String,
}

/// Display-ready doctor: chain registry joined with profile metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctor {
    pub address: Address,
    pub name: String,
    pub profession: String,
    pub hospital: String,
    pub is_approved: bool,
    pub status: Option<DoctorStatus>,
}

// ── Uploads ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: bool,
    pub cid: Option<ContentHash>,
}

// ── Serde helpers ────────────────────────────────────────────────────────────
//
// Store documents are written by several clients and are not schema-checked,
// so each field decodes on its own and falls back to "absent".

fn raw_value<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<serde_json::Value>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<DoctorStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_value(deserializer)?.as_str().and_then(DoctorStatus::parse))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_cid<'de, D>(deserializer: D) -> Result<Option<ContentHash>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.map(ContentHash::new))
}

/// Millisecond timestamps arrive as integers, floats or numeric strings.
fn millis(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(millis(&raw_value(deserializer)?))
}

fn lenient_created_at<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(millis(&raw_value(deserializer)?).unwrap_or(0))
}

fn lenient_relation<'de, D>(deserializer: D) -> Result<Relation, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        serde_json::Value::String(s) => Relation::from(s),
        _ => Relation::default(),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
