use serde::{Deserialize, Serialize};

/// Raw clinical trial record as loaded from the corpus export.
///
/// Notes:
/// - Field names mirror the registry export schema; every field except the
///   NCT identifier is optional and may be absent or blank in the data.
/// - Records are immutable once loaded. Index construction consumes them
///   into `Document`s and keeps only what citation rendering needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialRecord {
    #[serde(rename = "NCTId")]
    pub nct_id: String,
    #[serde(rename = "BriefTitle")]
    pub brief_title: Option<String>,
    #[serde(rename = "OfficialTitle")]
    pub official_title: Option<String>,
    #[serde(rename = "OverallStatus")]
    pub overall_status: Option<String>,
    #[serde(rename = "Phase")]
    pub phase: Option<String>,
    #[serde(rename = "StudyType")]
    pub study_type: Option<String>,
    #[serde(rename = "Conditions")]
    pub conditions: Option<String>,
    #[serde(rename = "Interventions")]
    pub interventions: Option<String>,
    #[serde(rename = "EligibilityCriteria")]
    pub eligibility_criteria: Option<String>,
    #[serde(rename = "HealthyVolunteers")]
    pub healthy_volunteers: Option<String>,
    #[serde(rename = "Sex")]
    pub sex: Option<String>,
    #[serde(rename = "MinimumAge")]
    pub minimum_age: Option<String>,
    #[serde(rename = "MaximumAge")]
    pub maximum_age: Option<String>,
    #[serde(rename = "StandardAges")]
    pub standard_ages: Option<String>,
    #[serde(rename = "PrimaryContactName")]
    pub primary_contact_name: Option<String>,
    #[serde(rename = "PrimaryContactEmail")]
    pub primary_contact_email: Option<String>,
    #[serde(rename = "PrimaryContactPhone")]
    pub primary_contact_phone: Option<String>,
    #[serde(rename = "PrincipalInvestigatorName")]
    pub principal_investigator_name: Option<String>,
    #[serde(rename = "PrincipalInvestigatorAffiliation")]
    pub principal_investigator_affiliation: Option<String>,
    #[serde(rename = "USLocations")]
    pub us_locations: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "StartDate")]
    pub start_date: Option<String>,
    #[serde(rename = "CompletionDate")]
    pub completion_date: Option<String>,
    #[serde(rename = "PrimaryOutcomes")]
    pub primary_outcomes: Option<String>,
    #[serde(rename = "SecondaryOutcomes")]
    pub secondary_outcomes: Option<String>,
}

/// Flattened, index-ready form of one trial record.
///
/// `search_text` is assembled in a fixed field order so tokenization, and
/// therefore scoring, is reproducible across rebuilds. `display_text` is the
/// citation-facing rendering used to assemble generation context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub nct_id: String,
    pub title: String,
    pub display_text: String,
    pub search_text: String,
}

const ELIGIBILITY_EXCERPT_CHARS: usize = 500;

fn push_labeled(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(v) = value {
        let v = v.trim();
        if !v.is_empty() {
            parts.push(format!("{label}: {v}"));
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    if t.chars().count() <= max_chars {
        return t.to_string();
    }
    let mut s: String = t.chars().take(max_chars).collect();
    s.push_str("...");
    s
}

/// Build the searchable flat document for one trial.
///
/// The concatenation order below is part of the index contract: changing it
/// changes token positions and document lengths, which changes scores.
pub fn build_document(trial: &TrialRecord) -> Document {
    let mut parts: Vec<String> = Vec::new();

    push_labeled(&mut parts, "Trial ID", Some(trial.nct_id.as_str()));
    push_labeled(&mut parts, "Title", trial.brief_title.as_deref());
    push_labeled(&mut parts, "Official Title", trial.official_title.as_deref());
    push_labeled(&mut parts, "Status", trial.overall_status.as_deref());
    push_labeled(&mut parts, "Phase", trial.phase.as_deref());
    push_labeled(&mut parts, "Study Type", trial.study_type.as_deref());
    push_labeled(&mut parts, "Conditions", trial.conditions.as_deref());
    push_labeled(&mut parts, "Interventions", trial.interventions.as_deref());
    if let Some(criteria) = trial.eligibility_criteria.as_deref() {
        let flat = criteria.replace('\n', " ");
        push_labeled(&mut parts, "Eligibility", Some(flat.as_str()));
    }
    push_labeled(&mut parts, "Healthy Volunteers", trial.healthy_volunteers.as_deref());
    push_labeled(&mut parts, "Sex", trial.sex.as_deref());
    push_labeled(&mut parts, "Minimum Age", trial.minimum_age.as_deref());
    push_labeled(&mut parts, "Maximum Age", trial.maximum_age.as_deref());
    push_labeled(&mut parts, "Ages", trial.standard_ages.as_deref());
    push_labeled(&mut parts, "Contact", trial.primary_contact_name.as_deref());
    push_labeled(&mut parts, "Email", trial.primary_contact_email.as_deref());
    push_labeled(&mut parts, "PI", trial.principal_investigator_name.as_deref());
    push_labeled(
        &mut parts,
        "Affiliation",
        trial.principal_investigator_affiliation.as_deref(),
    );
    push_labeled(&mut parts, "Locations", trial.us_locations.as_deref());
    push_labeled(&mut parts, "Country", trial.country.as_deref());
    push_labeled(&mut parts, "Start Date", trial.start_date.as_deref());
    push_labeled(&mut parts, "Completion Date", trial.completion_date.as_deref());
    push_labeled(&mut parts, "Primary Outcomes", trial.primary_outcomes.as_deref());
    push_labeled(&mut parts, "Secondary Outcomes", trial.secondary_outcomes.as_deref());

    Document {
        nct_id: trial.nct_id.clone(),
        title: trial
            .brief_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("N/A")
            .to_string(),
        display_text: build_display_text(trial),
        search_text: parts.join(" "),
    }
}

fn build_display_text(trial: &TrialRecord) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "Title: {}",
        trial.brief_title.as_deref().unwrap_or("N/A")
    ));
    push_labeled(&mut lines, "Official Title", trial.official_title.as_deref());
    lines.push(format!(
        "Status: {}",
        trial.overall_status.as_deref().unwrap_or("N/A")
    ));
    lines.push(format!("Phase: {}", trial.phase.as_deref().unwrap_or("N/A")));
    lines.push(format!(
        "Study Type: {}",
        trial.study_type.as_deref().unwrap_or("N/A")
    ));
    lines.push(format!(
        "Conditions: {}",
        trial.conditions.as_deref().unwrap_or("N/A")
    ));
    push_labeled(&mut lines, "Interventions", trial.interventions.as_deref());
    if let Some(criteria) = trial.eligibility_criteria.as_deref() {
        let flat = criteria.replace('\n', " ");
        if !flat.trim().is_empty() {
            lines.push(format!(
                "Eligibility (excerpt): {}",
                excerpt(&flat, ELIGIBILITY_EXCERPT_CHARS)
            ));
        }
    }
    push_labeled(&mut lines, "Healthy Volunteers", trial.healthy_volunteers.as_deref());
    push_labeled(&mut lines, "Sex", trial.sex.as_deref());
    if trial.minimum_age.is_some() || trial.maximum_age.is_some() {
        lines.push(format!(
            "Age Range: {} - {}",
            trial.minimum_age.as_deref().unwrap_or("N/A"),
            trial.maximum_age.as_deref().unwrap_or("N/A")
        ));
    }
    push_labeled(&mut lines, "Locations", trial.us_locations.as_deref());
    push_labeled(&mut lines, "Contact Email", trial.primary_contact_email.as_deref());
    push_labeled(&mut lines, "Contact Phone", trial.primary_contact_phone.as_deref());
    push_labeled(&mut lines, "Start Date", trial.start_date.as_deref());

    lines.join("\n")
}
