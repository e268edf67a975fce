use clubroll_core::db::open_db_in_memory;
use clubroll_core::{
    AttendanceRepository, Member, MemberEdit, MemberRepository, MemberService,
    MemberValidationError, NewMember, RegistryError, RepoError, SqliteAttendanceRepository,
    SqliteMemberRepository,
};
use rusqlite::Connection;

fn new_member(id: i64, name: &str) -> NewMember {
    NewMember {
        id,
        name: name.to_string(),
        grade: "10".to_string(),
        status: "active".to_string(),
        username: name.to_lowercase(),
        registered_paid: "yes".to_string(),
        money_owed: "5.25".to_string(),
        payment_method: "cash".to_string(),
    }
}

fn registry(conn: &Connection) -> MemberService<SqliteMemberRepository<'_>> {
    MemberService::new(SqliteMemberRepository::try_new(conn).unwrap())
}

fn row_count(conn: &Connection, table: &str, id: i64) -> i64 {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1;"),
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn add_then_lookup_returns_input_with_derived_email() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);

    let added = service.add(new_member(3, "Carol")).unwrap();
    let loaded = service.lookup(3).unwrap().unwrap();

    assert_eq!(added, loaded);
    assert_eq!(
        loaded,
        Member {
            id: 3,
            name: "Carol".to_string(),
            grade: 10,
            status: "active".to_string(),
            email: "carol@share.epsb.ca".to_string(),
            registered_paid: "yes".to_string(),
            money_owed: 5.25,
            payment_method: "cash".to_string(),
        }
    );
}

#[test]
fn add_creates_exactly_one_blank_attendance_row() {
    let conn = open_db_in_memory().unwrap();
    registry(&conn).add(new_member(7, "Dana")).unwrap();

    assert_eq!(row_count(&conn, "attendance", 7), 1);
    let record = SqliteAttendanceRepository::try_new(&conn)
        .unwrap()
        .get_attendance(7)
        .unwrap()
        .unwrap();
    assert_eq!(record.name, "Dana");
    assert!(record.marks.iter().all(Option::is_none));
}

#[test]
fn add_with_duplicate_id_is_a_conflict_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    service.add(new_member(1, "Alice")).unwrap();

    let err = service.add(new_member(1, "Impostor")).unwrap_err();
    assert!(matches!(err, RegistryError::Conflict(1)));
    assert_eq!(service.lookup(1).unwrap().unwrap().name, "Alice");
    assert_eq!(row_count(&conn, "attendance", 1), 1);
}

#[test]
fn add_rejects_blank_and_non_numeric_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);

    let mut blank_name = new_member(1, "Alice");
    blank_name.name = "   ".to_string();
    assert!(matches!(
        service.add(blank_name).unwrap_err(),
        RegistryError::Validation(MemberValidationError::BlankField("name"))
    ));

    let mut bad_grade = new_member(1, "Alice");
    bad_grade.grade = "ten".to_string();
    assert!(matches!(
        service.add(bad_grade).unwrap_err(),
        RegistryError::Validation(MemberValidationError::InvalidNumber { field: "grade", .. })
    ));

    let mut bad_money = new_member(1, "Alice");
    bad_money.money_owed = "free".to_string();
    assert!(matches!(
        service.add(bad_money).unwrap_err(),
        RegistryError::Validation(MemberValidationError::InvalidNumber {
            field: "money_owed",
            ..
        })
    ));

    assert!(service.lookup(1).unwrap().is_none());
    assert_eq!(row_count(&conn, "attendance", 1), 0);
}

#[test]
fn remove_deletes_member_and_attendance() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    service.add(new_member(4, "Eve")).unwrap();

    let removed = service.remove(4).unwrap();
    assert_eq!(removed.name, "Eve");
    assert!(service.lookup(4).unwrap().is_none());
    assert_eq!(row_count(&conn, "members", 4), 0);
    assert_eq!(row_count(&conn, "attendance", 4), 0);
}

#[test]
fn remove_and_edit_unknown_id_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);

    assert!(matches!(
        service.remove(99).unwrap_err(),
        RegistryError::NotFound(99)
    ));
    assert!(matches!(
        service.edit(99, &MemberEdit::default()).unwrap_err(),
        RegistryError::NotFound(99)
    ));
}

#[test]
fn edit_with_all_blank_fields_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    let before = service.add(new_member(2, "Bob")).unwrap();

    let blank = MemberEdit {
        name: " ".to_string(),
        ..MemberEdit::default()
    };
    let after = service.edit(2, &blank).unwrap();

    assert_eq!(before, after);
    assert_eq!(service.lookup(2).unwrap().unwrap(), before);
}

#[test]
fn edit_with_one_field_changes_only_that_field() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    let before = service.add(new_member(2, "Bob")).unwrap();

    let edit = MemberEdit {
        money_owed: "12.5".to_string(),
        ..MemberEdit::default()
    };
    let after = service.edit(2, &edit).unwrap();

    assert_eq!(after.money_owed, 12.5);
    assert_eq!(
        after,
        Member {
            money_owed: 12.5,
            ..before
        }
    );
}

#[test]
fn edit_username_rederives_email_and_leaves_attendance_alone() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    let before = service.add(new_member(2, "Bob")).unwrap();
    assert_eq!(service.current_username(&before), "bob");
    conn.execute("UPDATE attendance SET oct = 'Y' WHERE id = 2;", [])
        .unwrap();

    let edit = MemberEdit {
        username: "robert".to_string(),
        status: "executive".to_string(),
        ..MemberEdit::default()
    };
    let after = service.edit(2, &edit).unwrap();

    assert_eq!(after.id, 2);
    assert_eq!(after.email, "robert@share.epsb.ca");
    assert_eq!(after.status, "executive");
    assert_eq!(after.name, "Bob");
    let oct: Option<String> = conn
        .query_row("SELECT oct FROM attendance WHERE id = 2;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(oct.as_deref(), Some("Y"));
}

#[test]
fn edit_rejects_non_numeric_grade_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    let before = service.add(new_member(2, "Bob")).unwrap();

    let edit = MemberEdit {
        name: "Robert".to_string(),
        grade: "senior".to_string(),
        ..MemberEdit::default()
    };
    assert!(matches!(
        service.edit(2, &edit).unwrap_err(),
        RegistryError::Validation(_)
    ));
    assert_eq!(service.lookup(2).unwrap().unwrap(), before);
}

#[test]
fn custom_email_domain_is_normalized_and_applied() {
    let conn = open_db_in_memory().unwrap();
    let service =
        MemberService::with_email_domain(SqliteMemberRepository::try_new(&conn).unwrap(), "club.org");

    let added = service.add(new_member(5, "Finn")).unwrap();
    assert_eq!(service.email_domain(), "@club.org");
    assert_eq!(added.email, "finn@club.org");
    assert_eq!(service.current_username(&added), "finn");
}

#[test]
fn list_returns_members_ordered_by_id() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    service.add(new_member(9, "Zed")).unwrap();
    service.add(new_member(2, "Bob")).unwrap();
    service.add(new_member(5, "Finn")).unwrap();

    let ids = service
        .list()
        .unwrap()
        .into_iter()
        .map(|member| member.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 5, 9]);
}

#[test]
fn failed_attendance_insert_rolls_back_member_insert() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_attendance BEFORE INSERT ON attendance
         WHEN NEW.id = 13
         BEGIN
            SELECT RAISE(ABORT, 'attendance insert rejected');
         END;",
    )
    .unwrap();
    let service = registry(&conn);

    let err = service.add(new_member(13, "Unlucky")).unwrap_err();
    assert!(matches!(err, RegistryError::Repo(RepoError::Db(_))));
    assert_eq!(row_count(&conn, "members", 13), 0);
    assert_eq!(row_count(&conn, "attendance", 13), 0);
}

#[test]
fn failed_attendance_delete_rolls_back_member_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = registry(&conn);
    service.add(new_member(13, "Sticky")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER keep_attendance BEFORE DELETE ON attendance
         BEGIN
            SELECT RAISE(ABORT, 'attendance delete rejected');
         END;",
    )
    .unwrap();

    assert!(service.remove(13).is_err());
    assert_eq!(row_count(&conn, "members", 13), 1);
    assert_eq!(row_count(&conn, "attendance", 13), 1);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteMemberRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn bulk_create_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    let alice = new_member(1, "Alice").into_member("@share.epsb.ca").unwrap();
    let bob = new_member(2, "Bob").into_member("@share.epsb.ca").unwrap();
    let alice_again = new_member(1, "Alice").into_member("@share.epsb.ca").unwrap();

    let err = repo
        .create_members(&[alice.clone(), bob, alice_again])
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateId(1)));
    assert!(repo.list_members().unwrap().is_empty());

    assert_eq!(repo.create_members(&[alice]).unwrap(), 1);
    assert_eq!(row_count(&conn, "attendance", 1), 1);
}

#[test]
fn member_with_blank_legacy_field_is_readable_and_repairable() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO members VALUES
             (1, 'Alice', 10, 'active', 'alice@share.epsb.ca', 'yes', 0.0, '');
         INSERT INTO attendance (id) VALUES (1);",
    )
    .unwrap();
    let service = registry(&conn);

    let stored = service.lookup(1).unwrap().unwrap();
    assert_eq!(stored.payment_method, "");
    assert_eq!(service.list().unwrap().len(), 1);

    let touch_name = MemberEdit {
        name: "Alicia".to_string(),
        ..MemberEdit::default()
    };
    let err = service.edit(1, &touch_name).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Validation(MemberValidationError::BlankField("payment_method"))
    ));
    assert_eq!(service.lookup(1).unwrap().unwrap().name, "Alice");

    let repair = MemberEdit {
        payment_method: "cash".to_string(),
        ..MemberEdit::default()
    };
    let repaired = service.edit(1, &repair).unwrap();
    assert_eq!(repaired.payment_method, "cash");
    assert_eq!(repaired.name, "Alice");
}
