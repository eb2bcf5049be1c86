use crate::domain::TrialRecord;

/// Deterministic demo corpus, large enough to make retrieval rankings and
/// evaluation runs meaningful without shipping a registry export.
pub fn demo_trials() -> Vec<TrialRecord> {
    let conditions = [
        "Type 2 Diabetes",
        "Hypertension",
        "Asthma",
        "Post-Traumatic Stress Disorder",
        "Adolescent Obesity",
        "Breast Cancer",
    ];
    let interventions = [
        "Metformin",
        "Lifestyle Coaching",
        "Inhaled Corticosteroid",
        "Cognitive Behavioral Therapy",
        "Dietary Counseling",
        "Chemotherapy",
    ];
    let statuses = ["RECRUITING", "ACTIVE_NOT_RECRUITING", "COMPLETED"];
    let study_types = ["INTERVENTIONAL", "OBSERVATIONAL"];
    let cities = ["Boston", "Chicago", "Houston", "Seattle"];

    let mut out = Vec::new();
    for i in 1..=24u32 {
        let idx = (i - 1) as usize;
        let condition = conditions[idx % conditions.len()];
        let intervention = interventions[idx % interventions.len()];
        let status = statuses[idx % statuses.len()];
        let study_type = study_types[idx % study_types.len()];
        let city = cities[idx % cities.len()];

        out.push(TrialRecord {
            nct_id: format!("NCT{i:08}"),
            brief_title: Some(format!("{condition} {intervention} Study {i}")),
            official_title: Some(format!(
                "A Study of {intervention} in Participants With {condition}"
            )),
            overall_status: Some(status.to_string()),
            phase: Some(format!("PHASE{}", 1 + idx % 3)),
            study_type: Some(study_type.to_string()),
            conditions: Some(condition.to_string()),
            interventions: Some(intervention.to_string()),
            eligibility_criteria: Some(format!(
                "Inclusion Criteria: adults aged 18 and older diagnosed with {condition}.\n\
                 Exclusion Criteria: prior participation in study {i}."
            )),
            healthy_volunteers: Some(if idx % 4 == 0 { "yes" } else { "no" }.to_string()),
            sex: Some("ALL".to_string()),
            minimum_age: Some("18 Years".to_string()),
            maximum_age: Some("75 Years".to_string()),
            us_locations: Some(format!("{city}, United States")),
            country: Some("United States".to_string()),
            start_date: Some(format!("2026-{:02}-01", 1 + idx % 12)),
            ..TrialRecord::default()
        });
    }
    out
}
