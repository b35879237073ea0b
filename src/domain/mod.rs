use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{AFTERSCHOOL_COLLECTION, PRESCHOOL_COLLECTION};

/// Gender as stored on a child profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Exact, case-sensitive match; anything else becomes `Other`.
    pub fn coerce(value: &str) -> Self {
        match value {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn is_valid(value: &str) -> bool {
        matches!(value, "male" | "female" | "other")
    }
}

/// Whether the child attended a preschool before
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviousPreschool {
    Yes,
    No,
}

impl PreviousPreschool {
    /// Exact, case-sensitive match; anything else becomes `No`.
    pub fn coerce(value: &str) -> Self {
        match value {
            "yes" => PreviousPreschool::Yes,
            _ => PreviousPreschool::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviousPreschool::Yes => "yes",
            PreviousPreschool::No => "no",
        }
    }

    pub fn is_valid(value: &str) -> bool {
        matches!(value, "yes" | "no")
    }
}

/// The collection a child belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    Preschool,
    Afterschool,
}

impl Program {
    pub fn collection(&self) -> &'static str {
        match self {
            Program::Preschool => PRESCHOOL_COLLECTION,
            Program::Afterschool => AFTERSCHOOL_COLLECTION,
        }
    }

    pub fn all() -> [Program; 2] {
        [Program::Preschool, Program::Afterschool]
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Preschool => write!(f, "preschool"),
            Program::Afterschool => write!(f, "afterschool"),
        }
    }
}

/// A child profile produced by the roster import, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedProfile {
    pub name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub address: String,
    pub parent: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub photo: String,
    #[serde(default)]
    pub medical_conditions: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub previous_preschool: PreviousPreschool,
    #[serde(default)]
    pub additional_notes: String,
}

impl ImportedProfile {
    /// Value of a column from the header contract, as it would be exported.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value: &str = match column {
            "name" => &self.name,
            "dateOfBirth" => &self.date_of_birth,
            "gender" => self.gender.as_str(),
            "address" => &self.address,
            "parent" => &self.parent,
            "parentEmail" => &self.parent_email,
            "parentPhone" => &self.parent_phone,
            "photo" => &self.photo,
            "medicalConditions" => &self.medical_conditions,
            "emergencyContactName" => &self.emergency_contact_name,
            "emergencyContactPhone" => &self.emergency_contact_phone,
            "previousPreschool" => self.previous_preschool.as_str(),
            "additionalNotes" => &self.additional_notes,
            _ => return None,
        };
        Some(value)
    }
}

/// A stored child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub program: Program,
    #[serde(flatten)]
    pub profile: ImportedProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedChildInfo {
    pub id: String,
    pub name: String,
    pub program: Program,
}

/// A parent as seen by the admin dashboard: derived from the children that
/// name them, never stored on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub children: Vec<LinkedChildInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_coercion_is_case_sensitive() {
        assert_eq!(Gender::coerce("female"), Gender::Female);
        assert_eq!(Gender::coerce("Female"), Gender::Other);
        assert_eq!(Gender::coerce("robot"), Gender::Other);
        assert_eq!(Gender::coerce(""), Gender::Other);
        assert_eq!(PreviousPreschool::coerce("yes"), PreviousPreschool::Yes);
        assert_eq!(PreviousPreschool::coerce("maybe"), PreviousPreschool::No);
        assert_eq!(PreviousPreschool::coerce(""), PreviousPreschool::No);
    }

    #[test]
    fn test_child_serializes_with_portal_keys() {
        let child = Child {
            id: "abc".to_string(),
            program: Program::Afterschool,
            profile: ImportedProfile {
                name: "Jane".to_string(),
                date_of_birth: "2020-01-01".to_string(),
                gender: Gender::Female,
                address: String::new(),
                parent: String::new(),
                parent_email: "jane@example.com".to_string(),
                parent_phone: String::new(),
                photo: String::new(),
                medical_conditions: String::new(),
                emergency_contact_name: String::new(),
                emergency_contact_phone: String::new(),
                previous_preschool: PreviousPreschool::Yes,
                additional_notes: String::new(),
            },
        };

        let value = serde_json::to_value(&child).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["program"], "afterschool");
        assert_eq!(value["dateOfBirth"], "2020-01-01");
        assert_eq!(value["parentEmail"], "jane@example.com");
        assert_eq!(value["previousPreschool"], "yes");

        let back: Child = serde_json::from_value(value).unwrap();
        assert_eq!(back, child);
    }
}
