/// Column names the roster import expects and the export writes, in order.
pub const CHILD_HEADERS: [&str; 12] = [
    "name",
    "dateOfBirth",
    "gender",
    "address",
    "parent",
    "parentEmail",
    "parentPhone",
    "medicalConditions",
    "emergencyContactName",
    "emergencyContactPhone",
    "previousPreschool",
    "additionalNotes",
];

/// Photo reference given to every imported child; files never carry photos.
pub const PLACEHOLDER_PHOTO: &str = "https://placehold.co/100x100.png";

// Collection names (consistent with the portal's stored documents)
pub const PRESCHOOL_COLLECTION: &str = "children";
pub const AFTERSCHOOL_COLLECTION: &str = "afterschoolChildren";

pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;
/// Bulk writes get this many store timeouts.
pub const BULK_TIMEOUT_MULTIPLIER: u32 = 3;

pub const TSV_MIME_TYPE: &str = "text/tab-separated-values";

pub const MALFORMED_INPUT_MESSAGE: &str = "File must have a header row and at least one data row";

/// The header row as a single comma separated line, as offered for copying.
pub fn header_line() -> String {
    CHILD_HEADERS.join(",")
}
