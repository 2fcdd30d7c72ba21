use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role carried in the `role` custom claim of a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Recruiter,
    Interviewer,
    CompanyAdmin,
    SuperAdmin,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Candidate,
        Role::Recruiter,
        Role::Interviewer,
        Role::CompanyAdmin,
        Role::SuperAdmin,
    ];

    pub const STAFF: &'static [Role] = &[Role::Recruiter, Role::CompanyAdmin, Role::SuperAdmin];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "candidate" => Some(Role::Candidate),
            "recruiter" => Some(Role::Recruiter),
            "interviewer" => Some(Role::Interviewer),
            "company_admin" | "companyadmin" => Some(Role::CompanyAdmin),
            "super_admin" | "superadmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Recruiter => "recruiter",
            Role::Interviewer => "interviewer",
            Role::CompanyAdmin => "company_admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Recruiter | Role::Interviewer | Role::CompanyAdmin | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_claim_spellings() {
        assert_eq!(Role::parse("company_admin"), Some(Role::CompanyAdmin));
        assert_eq!(Role::parse("Company-Admin"), Some(Role::CompanyAdmin));
        assert_eq!(Role::parse("superAdmin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("hr"), None);
    }

    #[test]
    fn round_trips_through_as_str() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
    }
}
