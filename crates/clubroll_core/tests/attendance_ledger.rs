use clubroll_core::db::open_db_in_memory;
use clubroll_core::{
    AttendanceService, LedgerError, Mark, MeetingSlot, MemberService, NewMember,
    SqliteAttendanceRepository, SqliteMemberRepository,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn seeded(ids: &[(i64, &str)]) -> Connection {
    let conn = open_db_in_memory().unwrap();
    let registry = MemberService::new(SqliteMemberRepository::try_new(&conn).unwrap());
    for (id, name) in ids {
        registry
            .add(NewMember {
                id: *id,
                name: name.to_string(),
                grade: "11".to_string(),
                status: "active".to_string(),
                username: name.to_lowercase(),
                registered_paid: "yes".to_string(),
                money_owed: "0".to_string(),
                payment_method: "cash".to_string(),
            })
            .unwrap();
    }
    conn
}

fn ledger(conn: &Connection) -> AttendanceService<SqliteAttendanceRepository<'_>> {
    AttendanceService::new(SqliteAttendanceRepository::try_new(conn).unwrap())
}

#[test]
fn meeting_slots_are_the_ten_club_months() {
    let conn = open_db_in_memory().unwrap();
    let labels = ledger(&conn)
        .list_meeting_slots()
        .iter()
        .map(|slot| slot.label())
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec!["Sep", "Oct", "Nov", "Dec", "Jan", "Feb", "Mar", "Apr", "May", "June"]
    );
}

#[test]
fn roll_call_lists_members_with_names_in_id_order() {
    let conn = seeded(&[(2, "Bob"), (1, "Alice")]);
    let roster = ledger(&conn).roll_call().unwrap();
    let names = roster
        .iter()
        .map(|entry| (entry.member_id, entry.name.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(names, vec![(1, "Alice"), (2, "Bob")]);
}

#[test]
fn record_meeting_sets_only_the_chosen_slot_for_named_members() {
    let conn = seeded(&[(1, "Alice"), (2, "Bob"), (3, "Carol")]);
    let ledger = ledger(&conn);

    let october = BTreeMap::from([(1, Mark::Absent), (2, Mark::Attended), (3, Mark::Attended)]);
    ledger.record_meeting(MeetingSlot::Oct, &october).unwrap();

    let november = BTreeMap::from([(1, Mark::Attended), (3, Mark::Absent)]);
    assert_eq!(ledger.record_meeting(MeetingSlot::Nov, &november).unwrap(), 2);

    let sheet = ledger.list_attendance().unwrap();
    assert_eq!(sheet.len(), 3);
    assert_eq!(sheet[0].mark(MeetingSlot::Oct), Some(Mark::Absent));
    assert_eq!(sheet[0].mark(MeetingSlot::Nov), Some(Mark::Attended));
    assert_eq!(sheet[1].mark(MeetingSlot::Oct), Some(Mark::Attended));
    assert_eq!(sheet[1].mark(MeetingSlot::Nov), None);
    assert_eq!(sheet[2].mark(MeetingSlot::Nov), Some(Mark::Absent));
    for record in &sheet {
        for slot in MeetingSlot::ALL {
            if slot != MeetingSlot::Oct && slot != MeetingSlot::Nov {
                assert_eq!(record.mark(slot), None);
            }
        }
    }
}

#[test]
fn re_recording_a_meeting_overwrites_previous_marks() {
    let conn = seeded(&[(1, "Alice")]);
    let ledger = ledger(&conn);

    ledger
        .record_meeting(MeetingSlot::Jan, &BTreeMap::from([(1, Mark::Absent)]))
        .unwrap();
    ledger
        .record_meeting(MeetingSlot::Jan, &BTreeMap::from([(1, Mark::Attended)]))
        .unwrap();

    let sheet = ledger.list_attendance().unwrap();
    assert_eq!(sheet[0].mark(MeetingSlot::Jan), Some(Mark::Attended));
}

#[test]
fn unknown_member_rolls_back_the_whole_meeting() {
    let conn = seeded(&[(1, "Alice"), (2, "Bob")]);
    let ledger = ledger(&conn);

    let marks = BTreeMap::from([(1, Mark::Attended), (2, Mark::Attended), (42, Mark::Absent)]);
    let err = ledger.record_meeting(MeetingSlot::Sep, &marks).unwrap_err();
    assert!(matches!(err, LedgerError::UnknownMember(42)));

    let sheet = ledger.list_attendance().unwrap();
    assert!(sheet.iter().all(|record| record.is_blank()));
}

#[test]
fn record_meeting_by_name_accepts_columns_and_rejects_july() {
    let conn = seeded(&[(1, "Alice")]);
    let ledger = ledger(&conn);
    let marks = BTreeMap::from([(1, Mark::Attended)]);

    ledger.record_meeting_named("june", &marks).unwrap();
    assert_eq!(
        ledger.list_attendance().unwrap()[0].mark(MeetingSlot::Jun),
        Some(Mark::Attended)
    );

    let err = ledger.record_meeting_named("jul", &marks).unwrap_err();
    assert!(matches!(err, LedgerError::UnknownSlot(_)));
}

#[test]
fn late_joiner_keeps_null_for_meetings_held_before_joining() {
    let conn = seeded(&[(1, "Alice")]);
    ledger(&conn)
        .record_meeting(MeetingSlot::Sep, &BTreeMap::from([(1, Mark::Attended)]))
        .unwrap();

    let registry = MemberService::new(SqliteMemberRepository::try_new(&conn).unwrap());
    registry
        .add(NewMember {
            id: 2,
            name: "Bob".to_string(),
            grade: "9".to_string(),
            status: "new".to_string(),
            username: "bob".to_string(),
            registered_paid: "no".to_string(),
            money_owed: "20".to_string(),
            payment_method: "cash".to_string(),
        })
        .unwrap();

    let sheet = ledger(&conn).list_attendance().unwrap();
    assert_eq!(sheet[1].member_id, 2);
    assert_eq!(sheet[1].mark(MeetingSlot::Sep), None);
}

#[test]
fn sheet_counts_attended_and_recorded_meetings() {
    let conn = seeded(&[(1, "Alice"), (2, "Bob")]);
    let ledger = ledger(&conn);
    ledger
        .record_meeting(
            MeetingSlot::Sep,
            &BTreeMap::from([(1, Mark::Attended), (2, Mark::Absent)]),
        )
        .unwrap();
    ledger
        .record_meeting(MeetingSlot::Oct, &BTreeMap::from([(1, Mark::Attended)]))
        .unwrap();

    let sheet = ledger.list_attendance().unwrap();
    assert_eq!(sheet[0].attended_count(), 2);
    assert_eq!(sheet[0].recorded_count(), 2);
    assert_eq!(sheet[1].attended_count(), 0);
    assert_eq!(sheet[1].recorded_count(), 1);
}

#[test]
fn consistency_check_reports_orphans_on_both_sides() {
    let conn = seeded(&[(1, "Alice"), (2, "Bob")]);
    assert!(ledger(&conn).check_consistency().unwrap().is_consistent());

    conn.execute("DELETE FROM attendance WHERE id = 2;", [])
        .unwrap();
    conn.execute("INSERT INTO attendance (id) VALUES (77);", [])
        .unwrap();

    let report = ledger(&conn).check_consistency().unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.members_without_attendance, vec![2]);
    assert_eq!(report.attendance_without_member, vec![77]);
}

#[test]
fn legacy_answers_decode_and_unknown_text_is_kept_verbatim() {
    let conn = seeded(&[(1, "Alice")]);
    conn.execute_batch(
        "UPDATE attendance
         SET sep = 'yes', oct = 'No', nov = ' y ', dec = '', feb = 'maybe'
         WHERE id = 1;",
    )
    .unwrap();

    let sheet = ledger(&conn).list_attendance().unwrap();
    let record = &sheet[0];
    assert_eq!(record.mark(MeetingSlot::Sep), Some(Mark::Attended));
    assert_eq!(record.mark(MeetingSlot::Oct), Some(Mark::Absent));
    assert_eq!(record.mark(MeetingSlot::Nov), Some(Mark::Attended));
    assert_eq!(record.mark(MeetingSlot::Dec), None);
    assert_eq!(record.mark(MeetingSlot::Feb), None);
    assert_eq!(
        record.unrecognized.get(&MeetingSlot::Feb).map(String::as_str),
        Some("maybe")
    );
    assert_eq!(record.recorded_count(), 4);
}

#[test]
fn recording_over_unknown_text_replaces_it_with_a_mark() {
    let conn = seeded(&[(1, "Alice")]);
    conn.execute("UPDATE attendance SET feb = 'maybe' WHERE id = 1;", [])
        .unwrap();

    let ledger = ledger(&conn);
    ledger
        .record_meeting(MeetingSlot::Feb, &BTreeMap::from([(1, Mark::Absent)]))
        .unwrap();

    let record = &ledger.list_attendance().unwrap()[0];
    assert_eq!(record.mark(MeetingSlot::Feb), Some(Mark::Absent));
    assert!(record.unrecognized.is_empty());
}

#[test]
fn attendance_sheet_serializes_with_snake_case_marks() {
    let conn = seeded(&[(1, "Alice")]);
    let ledger = ledger(&conn);
    ledger
        .record_meeting(MeetingSlot::Dec, &BTreeMap::from([(1, Mark::Absent)]))
        .unwrap();

    let sheet = ledger.list_attendance().unwrap();
    let value = serde_json::to_value(&sheet[0]).unwrap();
    assert_eq!(value["member_id"], 1);
    assert_eq!(value["name"], "Alice");
    assert_eq!(value["marks"][3], "absent");
    assert!(value["marks"][0].is_null());
    assert_eq!(serde_json::to_value(MeetingSlot::Jun).unwrap(), "jun");
}
