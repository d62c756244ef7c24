//! Schema validation and input sanitization.
//!
//! Validation runs before any draft reaches the adapter: required fields,
//! length bounds, numeric ranges, and email format. `sanitize_pattern`
//! strips characters that could alter filter grammar from free text headed
//! into a pattern-match condition. The adapter still sends every value as a
//! structured, URL-encoded parameter; sanitization here is defense-in-depth,
//! not the sole barrier.

use crate::StoreError;
use crate::model::{JobPatch, NewApplication, NewJob, NewUser};
use std::sync::LazyLock;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_COMPANY_LEN: usize = 200;
pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 20_000;
pub const MAX_COVER_LETTER_LEN: usize = 5_000;
pub const MAX_NOTES_LEN: usize = 5_000;
pub const MAX_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Characters stripped from text destined for pattern-match filters.
///
/// Covers quote characters, statement separators, and the filter grammar's
/// reserved punctuation (wildcards, list delimiters).
const PATTERN_STRIP: &[char] = &['\'', '"', '`', ';', ',', '(', ')', '*', '%', '\\'];

/// Strip filter-grammar characters from free text.
///
/// Control characters are removed as well; surrounding whitespace is
/// trimmed. The result may be empty, in which case callers should drop the
/// pattern condition entirely.
pub fn sanitize_pattern(text: &str) -> String {
    text.chars()
        .filter(|c| !PATTERN_STRIP.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn require(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(field, "is required"));
    }
    Ok(())
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<(), StoreError> {
    if value.len() > max {
        return Err(StoreError::validation(field, format!("exceeds {max} characters")));
    }
    Ok(())
}

fn salary_range(salary_min: Option<u32>, salary_max: Option<u32>) -> Result<(), StoreError> {
    if let (Some(min), Some(max)) = (salary_min, salary_max)
        && min > max
    {
        return Err(StoreError::validation("salary_min", "must not exceed salary_max"));
    }
    Ok(())
}

/// Validate a job creation draft.
pub fn validate_new_job(new: &NewJob) -> Result<(), StoreError> {
    require("title", &new.title)?;
    bounded("title", &new.title, MAX_TITLE_LEN)?;
    require("company", &new.company)?;
    bounded("company", &new.company, MAX_COMPANY_LEN)?;
    bounded("location", &new.location, MAX_LOCATION_LEN)?;
    bounded("description", &new.description, MAX_DESCRIPTION_LEN)?;
    salary_range(new.salary_min, new.salary_max)?;
    Ok(())
}

/// Validate a partial job update.
pub fn validate_job_patch(patch: &JobPatch) -> Result<(), StoreError> {
    if let Some(title) = &patch.title {
        require("title", title)?;
        bounded("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(company) = &patch.company {
        require("company", company)?;
        bounded("company", company, MAX_COMPANY_LEN)?;
    }
    if let Some(location) = &patch.location {
        bounded("location", location, MAX_LOCATION_LEN)?;
    }
    if let Some(description) = &patch.description {
        bounded("description", description, MAX_DESCRIPTION_LEN)?;
    }
    salary_range(patch.salary_min, patch.salary_max)?;
    Ok(())
}

/// Validate an application submission draft.
pub fn validate_new_application(new: &NewApplication) -> Result<(), StoreError> {
    require("user_id", &new.user_id)?;
    require("job_id", &new.job_id)?;
    bounded("cover_letter", &new.cover_letter, MAX_COVER_LETTER_LEN)?;
    bounded("notes", &new.notes, MAX_NOTES_LEN)?;
    Ok(())
}

/// Validate a registration draft.
pub fn validate_new_user(new: &NewUser) -> Result<(), StoreError> {
    require("name", &new.name)?;
    bounded("name", &new.name, MAX_NAME_LEN)?;
    require("email", &new.email)?;
    bounded("email", &new.email, MAX_EMAIL_LEN)?;
    if !EMAIL_RE.is_match(new.email.trim()) {
        return Err(StoreError::validation("email", "invalid email format"));
    }
    if new.password.len() < MIN_PASSWORD_LEN {
        return Err(StoreError::validation("password", format!("must be at least {MIN_PASSWORD_LEN} characters")));
    }
    Ok(())
}
