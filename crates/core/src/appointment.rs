//! Follow-up appointment suggestions.
//!
//! Maps a diagnosis context to a day offset through a fixed priority table, then anchors the
//! offset on the UTC calendar day of the reference timestamp. The result is a proposal: nothing
//! is persisted and the clinician keeps the final say.

use crate::constants::*;
use crate::date_math::{add_days, utc_day};
use crate::models::{AppointmentSuggestion, DiagnosisContext};
use care_types::{ConditionType, Severity, VisitType};
use chrono::{DateTime, TimeZone};

/// Which row of the decision table produced an offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUpRule {
    /// Critical severity or an emergency visit.
    Urgent,
    /// Severe, regardless of condition.
    Severe,
    Pregnancy,
    /// Diabetes or hypertension.
    Chronic,
    Tuberculosis,
    General,
}

/// Offset in days plus the rule that chose it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowUpOffset {
    pub days: u32,
    pub rule: FollowUpRule,
}

/// Evaluates the decision table; the first matching row wins.
///
/// The `severe` arms inside the chronic and general rows can never be reached because the
/// `Severe` row sits above them. They are kept so the table reads the same as the clinical
/// guideline it encodes.
pub fn follow_up_offset(ctx: &DiagnosisContext) -> FollowUpOffset {
    let severity = ctx.severity;
    let decide = |days, rule| FollowUpOffset { days, rule };

    if severity == Some(Severity::Critical) || ctx.visit_type == VisitType::Emergency {
        return decide(URGENT_OFFSET_DAYS, FollowUpRule::Urgent);
    }
    if severity == Some(Severity::Severe) {
        return decide(SEVERE_OFFSET_DAYS, FollowUpRule::Severe);
    }

    match ctx.condition_type {
        ConditionType::Pregnancy => {
            let days = match severity {
                Some(Severity::Moderate) => PREGNANCY_MODERATE_OFFSET_DAYS,
                Some(Severity::Mild) => PREGNANCY_MILD_OFFSET_DAYS,
                _ => PREGNANCY_ROUTINE_OFFSET_DAYS,
            };
            decide(days, FollowUpRule::Pregnancy)
        }
        ConditionType::Diabetes | ConditionType::Hypertension => {
            let days = match severity {
                Some(Severity::Moderate) => CHRONIC_MODERATE_OFFSET_DAYS,
                Some(Severity::Severe) => CHRONIC_SEVERE_OFFSET_DAYS,
                _ => CHRONIC_ROUTINE_OFFSET_DAYS,
            };
            decide(days, FollowUpRule::Chronic)
        }
        ConditionType::Tuberculosis => decide(TUBERCULOSIS_OFFSET_DAYS, FollowUpRule::Tuberculosis),
        ConditionType::Other | ConditionType::Unspecified => {
            let days = match severity {
                Some(Severity::Moderate) => DEFAULT_MODERATE_OFFSET_DAYS,
                Some(Severity::Severe) => DEFAULT_SEVERE_OFFSET_DAYS,
                _ => DEFAULT_ROUTINE_OFFSET_DAYS,
            };
            decide(days, FollowUpRule::General)
        }
    }
}

/// Suggests the next appointment for `ctx`, counted from the UTC day of `reference`.
pub fn suggest_next_appointment<Tz: TimeZone>(
    ctx: &DiagnosisContext,
    reference: &DateTime<Tz>,
) -> AppointmentSuggestion {
    let offset = follow_up_offset(ctx);
    let suggested_date = add_days(utc_day(reference), offset.days);

    tracing::debug!(
        days = offset.days,
        rule = ?offset.rule,
        %suggested_date,
        "follow-up suggested"
    );

    AppointmentSuggestion {
        suggested_date,
        days_from_now: offset.days,
        rationale: rationale(ctx, offset),
    }
}

fn rationale(ctx: &DiagnosisContext, offset: FollowUpOffset) -> String {
    let mut parts = vec![lead_sentence(ctx)];
    if let Some(clause) = condition_clause(ctx, offset) {
        parts.push(clause);
    }
    parts.push(risk_band_closer(offset.days).to_string());
    parts.join(" ")
}

fn lead_sentence(ctx: &DiagnosisContext) -> String {
    let diagnosis = ctx
        .diagnosis_name
        .as_ref()
        .map(|name| name.as_str())
        .unwrap_or_else(|| condition_label(ctx.condition_type));
    let visit = match ctx.visit_type {
        VisitType::Outpatient => "an outpatient visit",
        VisitType::Inpatient => "an inpatient stay",
        VisitType::Emergency => "an emergency visit",
        VisitType::Followup => "a follow-up visit",
    };

    match ctx.severity {
        Some(severity) => format!(
            "{} {} presentation at {}.",
            capitalise(severity.as_str()),
            diagnosis,
            visit
        ),
        None => format!(
            "{} presentation (severity not recorded) at {}.",
            capitalise(diagnosis),
            visit
        ),
    }
}

fn condition_label(condition: ConditionType) -> &'static str {
    match condition {
        ConditionType::Other | ConditionType::Unspecified => "unspecified condition",
        other => other.as_str(),
    }
}

fn condition_clause(ctx: &DiagnosisContext, offset: FollowUpOffset) -> Option<String> {
    let clause = match ctx.condition_type {
        ConditionType::Pregnancy => {
            "Antenatal care (ANC) contacts follow the pregnancy schedule, closer together when symptoms are present.".to_string()
        }
        ConditionType::Diabetes | ConditionType::Hypertension
            if offset.rule == FollowUpRule::Chronic && ctx.severity == Some(Severity::Severe) =>
        {
            format!(
                "Poorly controlled {} is reviewed weekly until readings stabilise.",
                ctx.condition_type
            )
        }
        ConditionType::Diabetes => {
            "Chronic disease review cadence: blood sugar control and medication adherence are reassessed at each visit.".to_string()
        }
        ConditionType::Hypertension => {
            "Chronic disease review cadence: blood pressure control and medication adherence are reassessed at each visit.".to_string()
        }
        ConditionType::Tuberculosis => {
            "TB treatment is monitored at monthly milestones for adherence, side effects and sputum follow-up.".to_string()
        }
        ConditionType::Other | ConditionType::Unspecified => return None,
    };
    Some(clause)
}

fn risk_band_closer(days: u32) -> &'static str {
    if days <= SHORT_INTERVAL_MAX_DAYS {
        "Short interval recommended given higher risk; return sooner if symptoms worsen."
    } else if days <= REVIEW_INTERVAL_MAX_DAYS {
        "Two-week review window to reassess response to treatment."
    } else {
        "Stable, lower-risk presentation suitable for routine follow-up."
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_types::NonEmptyText;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn ctx(
        severity: Option<Severity>,
        condition_type: ConditionType,
        visit_type: VisitType,
    ) -> DiagnosisContext {
        DiagnosisContext {
            severity,
            condition_type,
            visit_type,
            diagnosis_name: None,
        }
    }

    fn every_severity() -> Vec<Option<Severity>> {
        std::iter::once(None)
            .chain(Severity::ALL.iter().copied().map(Some))
            .collect()
    }

    fn days(severity: Option<Severity>, condition: ConditionType) -> u32 {
        follow_up_offset(&ctx(severity, condition, VisitType::Outpatient)).days
    }

    #[test]
    fn critical_or_emergency_is_one_day() {
        for &condition in ConditionType::ALL {
            for &visit in VisitType::ALL {
                let offset = follow_up_offset(&ctx(Some(Severity::Critical), condition, visit));
                assert_eq!(offset.days, 1);
                assert_eq!(offset.rule, FollowUpRule::Urgent);
            }
            for severity in every_severity() {
                let offset = follow_up_offset(&ctx(severity, condition, VisitType::Emergency));
                assert_eq!(offset.days, 1, "{severity:?} {condition} emergency");
            }
        }
    }

    #[test]
    fn severe_is_three_days_for_every_condition() {
        for &condition in ConditionType::ALL {
            let offset = follow_up_offset(&ctx(Some(Severity::Severe), condition, VisitType::Inpatient));
            assert_eq!(offset.days, 3);
            assert_eq!(offset.rule, FollowUpRule::Severe);
        }
    }

    #[test]
    fn pregnancy_offsets() {
        assert_eq!(days(Some(Severity::Moderate), ConditionType::Pregnancy), 7);
        assert_eq!(days(Some(Severity::Mild), ConditionType::Pregnancy), 28);
        assert_eq!(days(None, ConditionType::Pregnancy), 21);
    }

    #[test]
    fn chronic_offsets() {
        for condition in [ConditionType::Diabetes, ConditionType::Hypertension] {
            assert_eq!(days(Some(Severity::Moderate), condition), 14);
            assert_eq!(days(Some(Severity::Mild), condition), 30);
            assert_eq!(days(None, condition), 30);
        }
    }

    #[test]
    fn tuberculosis_is_monthly_unless_urgent_or_severe() {
        assert_eq!(days(None, ConditionType::Tuberculosis), 30);
        assert_eq!(days(Some(Severity::Mild), ConditionType::Tuberculosis), 30);
        assert_eq!(days(Some(Severity::Moderate), ConditionType::Tuberculosis), 30);
    }

    #[test]
    fn general_offsets() {
        for condition in [ConditionType::Other, ConditionType::Unspecified] {
            assert_eq!(days(Some(Severity::Moderate), condition), 14);
            assert_eq!(days(Some(Severity::Mild), condition), 30);
            assert_eq!(days(None, condition), 30);
        }
    }

    #[test]
    fn suggested_date_is_utc_day_plus_offset() {
        let reference = Utc.with_ymd_and_hms(2024, 2, 29, 16, 45, 0).unwrap();
        for severity in every_severity() {
            for &condition in ConditionType::ALL {
                for &visit in VisitType::ALL {
                    let c = ctx(severity, condition, visit);
                    let s = suggest_next_appointment(&c, &reference);
                    let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
                        .unwrap()
                        .checked_add_days(chrono::Days::new(u64::from(s.days_from_now)))
                        .unwrap();
                    assert_eq!(s.suggested_date, expected);
                }
            }
        }
    }

    #[test]
    fn leap_day_reference_crosses_into_march() {
        let reference = Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap();

        let urgent = suggest_next_appointment(
            &ctx(Some(Severity::Critical), ConditionType::Other, VisitType::Outpatient),
            &reference,
        );
        assert_eq!(urgent.suggested_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let antenatal = suggest_next_appointment(
            &ctx(Some(Severity::Mild), ConditionType::Pregnancy, VisitType::Outpatient),
            &reference,
        );
        assert_eq!(antenatal.suggested_date, NaiveDate::from_ymd_opt(2024, 3, 28).unwrap());
    }

    #[test]
    fn reference_is_normalised_to_utc_day() {
        // 22:00 on 29 Feb in UTC-5 is already 1 March in UTC.
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let reference = west.with_ymd_and_hms(2024, 2, 29, 22, 0, 0).unwrap();
        let s = suggest_next_appointment(
            &ctx(Some(Severity::Severe), ConditionType::Other, VisitType::Outpatient),
            &reference,
        );
        assert_eq!(s.suggested_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn year_end_rollover() {
        let reference = Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap();
        let s = suggest_next_appointment(
            &ctx(None, ConditionType::Tuberculosis, VisitType::Followup),
            &reference,
        );
        assert_eq!(s.suggested_date, NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
    }

    #[test]
    fn rationale_names_context_and_risk_band() {
        let mut c = ctx(Some(Severity::Moderate), ConditionType::Pregnancy, VisitType::Outpatient);
        c.diagnosis_name = Some(NonEmptyText::new("pre-eclampsia watch").unwrap());
        let reference = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

        let s = suggest_next_appointment(&c, &reference);
        assert!(s.rationale.starts_with("Moderate pre-eclampsia watch presentation at an outpatient visit."));
        assert!(s.rationale.contains("Antenatal care (ANC)"));
        assert!(s.rationale.contains("Two-week review"));
    }

    #[test]
    fn rationale_bands_follow_offset() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

        let urgent = suggest_next_appointment(
            &ctx(None, ConditionType::Diabetes, VisitType::Emergency),
            &reference,
        );
        assert!(urgent.rationale.contains("Short interval"));
        assert!(urgent.rationale.contains("blood sugar"));

        let routine = suggest_next_appointment(
            &ctx(None, ConditionType::Hypertension, VisitType::Followup),
            &reference,
        );
        assert!(routine.rationale.starts_with("Hypertension presentation (severity not recorded)"));
        assert!(routine.rationale.contains("blood pressure"));
        assert!(routine.rationale.contains("Stable, lower-risk"));

        let tb = suggest_next_appointment(
            &ctx(Some(Severity::Mild), ConditionType::Tuberculosis, VisitType::Outpatient),
            &reference,
        );
        assert!(tb.rationale.contains("monthly milestones"));
    }

    #[test]
    fn rationale_omits_clause_for_general_conditions() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let s = suggest_next_appointment(
            &ctx(Some(Severity::Moderate), ConditionType::Other, VisitType::Inpatient),
            &reference,
        );
        assert_eq!(
            s.rationale,
            "Moderate unspecified condition presentation at an inpatient stay. \
             Two-week review window to reassess response to treatment."
        );
    }

    #[test]
    fn shadowed_chronic_severe_clause_is_distinct() {
        let c = ctx(Some(Severity::Severe), ConditionType::Diabetes, VisitType::Outpatient);
        let reachable = condition_clause(&c, follow_up_offset(&c)).unwrap();
        let shadowed = condition_clause(
            &c,
            FollowUpOffset {
                days: CHRONIC_SEVERE_OFFSET_DAYS,
                rule: FollowUpRule::Chronic,
            },
        )
        .unwrap();
        assert!(reachable.contains("blood sugar"));
        assert!(shadowed.contains("Poorly controlled diabetes"));
    }
}
