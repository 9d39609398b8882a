//! Renders [`UserContext`] into the plain-text fact block embedded in the
//! system prompt.
//!
//! One line per populated field, always in the same order, preceded by the
//! current date and time. Absent or empty fields produce no line at all.

use crate::models::{EmergencyContact, Medication, UserContext};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// Render the context block for the given instant.
pub fn render_context<Tz>(ctx: &UserContext, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![format!(
        "Current date and time: {} at {}",
        now.format("%A, %B %-d, %Y"),
        now.format("%-I:%M %p")
    )];

    if let Some(location) = &ctx.location {
        lines.push(format!("Location: {}", location));
    }

    if !ctx.medications.is_empty() {
        lines.push(format!(
            "Medications: {}",
            join(&ctx.medications, render_medication)
        ));
    }

    if !ctx.item_locations.is_empty() {
        lines.push(format!(
            "Item locations: {}",
            join(&ctx.item_locations, |(item, place)| format!("{}: {}", item, place))
        ));
    }

    if let Some(intake) = ctx.water_intake {
        lines.push(format!(
            "Water intake: {} cups out of {} cup daily goal",
            format_number(intake),
            format_number(ctx.effective_water_goal())
        ));
    }

    if !ctx.emergency_contacts.is_empty() {
        lines.push(format!(
            "Emergency contacts: {}",
            join(&ctx.emergency_contacts, |EmergencyContact { name, phone }| {
                format!("{}: {}", name, phone)
            })
        ));
    }

    lines.join("\n")
}

/// Render the context block against the local wall clock.
pub fn render_context_now(ctx: &UserContext) -> String {
    render_context(ctx, &Local::now())
}

fn render_medication(med: &Medication) -> String {
    let status = if med.taken { "taken" } else { "not taken yet" };
    match &med.time {
        Some(time) => format!("{} at {} ({} today)", med.name, time, status),
        None => format!("{} ({} today)", med.name, status),
    }
}

fn join<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(", ")
}

/// Whole numbers print without a fractional part (`3`, not `3.0`).
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
