//! Plain-text rendering of a [`DashboardView`].

use crate::state::{DashboardStatus, DashboardView};
use api_shared::{Consultation, Patient};
use intake_types::PainLevel;
use std::fmt::Write as _;

/// Renders the header, the patients table and the consultations table.
pub fn render(view: &DashboardView) -> String {
    let mut out = render_header(view);
    out.push('\n');
    out.push_str(&render_patients(&view.patients));
    out.push('\n');
    out.push_str(&render_consultations(&view.consultations));
    out
}

pub fn render_header(view: &DashboardView) -> String {
    let status = match &view.status {
        DashboardStatus::Loading => "loading".to_string(),
        DashboardStatus::Ready => "ready".to_string(),
        DashboardStatus::Error(message) => format!("error: {message}"),
    };
    let updated = view
        .last_update
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let auto = if view.auto_refresh_enabled { "on" } else { "off" };
    let refreshing = if view.refreshing { "  (refreshing...)" } else { "" };

    format!(
        "Clinic admin dashboard\n\
         Patients: {}  Consultations: {}\n\
         Last update: {updated}  Auto-refresh: {auto}  Status: {status}{refreshing}\n",
        view.patients.len(),
        view.consultations.len(),
    )
}

pub fn render_patients(patients: &[Patient]) -> String {
    if patients.is_empty() {
        return "No patients registered yet.\n".to_string();
    }

    let mut out = String::from("PATIENTS\n");
    let _ = writeln!(
        out,
        "{:>5}  {:<32}  {:<10}  {:<8}  {:<16}  {:<16}  {:<16}",
        "ID", "NAME", "BORN", "GENDER", "PHONE", "CITY", "REGISTERED"
    );
    for p in patients {
        let _ = writeln!(
            out,
            "{:>5}  {:<32}  {:<10}  {:<8}  {:<16}  {:<16}  {:<16}",
            p.id,
            cell(&p.display_name(), 32),
            p.date_of_birth.format("%Y-%m-%d").to_string(),
            cell(&p.gender, 8),
            cell(&p.phone, 16),
            cell(&p.city, 16),
            p.created_at.format("%Y-%m-%d %H:%M").to_string(),
        );
    }
    out
}

pub fn render_consultations(consultations: &[Consultation]) -> String {
    if consultations.is_empty() {
        return "No consultations recorded yet.\n".to_string();
    }

    let mut out = String::from("CONSULTATIONS\n");
    let _ = writeln!(
        out,
        "{:>5}  {:<24}  {:>3}  {:>6}  {:>6}  {:>5}  {:<11}  {:>5}  {:<24}  {:<16}",
        "ID", "PATIENT", "AGE", "HEIGHT", "WEIGHT", "BMI", "STATUS", "PAIN", "EXAMS", "RECORDED"
    );
    for c in consultations {
        let bmi = c
            .bmi
            .map(|b| format!("{b:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let status = c.bmi_status.map(|s| s.label()).unwrap_or("-");
        let exams = c.ordered_exams();
        let exams = if exams.is_empty() {
            "-".to_string()
        } else {
            exams.join(", ")
        };
        let _ = writeln!(
            out,
            "{:>5}  {:<24}  {:>3}  {:>6}  {:>6}  {:>5}  {:<11}  {:>5}  {:<24}  {:<16}",
            c.id,
            cell(&c.patient_name, 24),
            c.age,
            c.height,
            c.weight,
            bmi,
            status,
            PainLevel::clamped(c.pain_level.into()).to_string(),
            cell(&exams, 24),
            c.created_at.format("%Y-%m-%d %H:%M").to_string(),
        );
    }
    out
}

/// Truncates to `width` characters, marking the cut with `~`.
fn cell(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
