//! Grid rendering for the member and attendance views.

use clubroll_core::{AttendanceRecord, MeetingSlot, Member};

const MEMBER_HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Grade",
    "Club Status",
    "Email",
    "Registered/Paid",
    "Money Owed ($)",
    "Payment Method",
];

/// Renders members as a boxed grid.
pub fn render_members(members: &[Member]) -> String {
    let rows = members
        .iter()
        .map(|member| {
            vec![
                member.id.to_string(),
                member.name.clone(),
                member.grade.to_string(),
                member.status.clone(),
                member.email.clone(),
                member.registered_paid.clone(),
                format!("{:.2}", member.money_owed),
                member.payment_method.clone(),
            ]
        })
        .collect::<Vec<_>>();
    render_grid(&MEMBER_HEADERS, &rows)
}

/// Renders the attendance sheet with a per-member attended total.
///
/// Unrecorded meetings are left empty; stored values that are no mark are
/// shown as found.
pub fn render_attendance(records: &[AttendanceRecord]) -> String {
    let mut headers = vec!["ID", "Name"];
    headers.extend(MeetingSlot::ALL.iter().map(|slot| slot.label()));
    headers.push("Attended");

    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![record.member_id.to_string(), record.name.clone()];
            row.extend(MeetingSlot::ALL.iter().map(|slot| slot_cell(record, *slot)));
            row.push(record.attended_count().to_string());
            row
        })
        .collect::<Vec<_>>();
    render_grid(&headers, &rows)
}

fn slot_cell(record: &AttendanceRecord, slot: MeetingSlot) -> String {
    match (record.mark(slot), record.unrecognized.get(&slot)) {
        (Some(mark), _) => mark.as_db().to_string(),
        (None, Some(raw)) => raw.clone(),
        (None, None) => String::new(),
    }
}

fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = border_line(&widths, '┌', '┬', '┐');
    out.push_str(&content_line(&widths, headers.iter().copied()));
    out.push_str(&border_line(&widths, '├', '┼', '┤'));
    for row in rows {
        out.push_str(&content_line(&widths, row.iter().map(String::as_str)));
    }
    out.push_str(&border_line(&widths, '└', '┴', '┘'));
    out
}

fn border_line(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push(mid);
        }
        line.push_str(&"─".repeat(width + 2));
    }
    line.push(right);
    line.push('\n');
    line
}

fn content_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("│");
    for (cell, width) in cells.zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('│');
    }
    line.push('\n');
    line
}
