//! Interactive menu loop.
//!
//! # Responsibility
//! - Drive the main, member and attendance menus as an explicit state machine.
//! - Re-prompt on invalid input; report unknown or duplicate ids and return
//!   to the main menu.
//!
//! # Invariants
//! - Choosing exit at any menu level ends `run` with `Ok(())`.
//! - End of input is treated as exit; a half-finished roll call is dropped.
//! - Quitting a roll call with `q` records only the answers already given.

use clubroll_core::model::member::{parse_grade, parse_money};
use clubroll_core::{
    parse_response, AttendanceService, MeetingSlot, MemberEdit, MemberId, MemberService,
    MemberValidationError, NewMember, RegistryError, RepoError, SqliteAttendanceRepository,
    SqliteMemberRepository,
};
use log::warn;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};

use crate::table::{render_attendance, render_members};

const MAIN_MENU: &str = "
Choose From the Options Below
1. View Member Database
2. View Attendance Database
3. Exit";

const MEMBER_MENU: &str = "
Choose From the Options Below
1. Add Member
2. Remove Member
3. Edit Member
4. Return to Main Menu
5. Exit";

const ATTENDANCE_MENU: &str = "
Choose From the Options Below
1. Take attendance
2. Return to Main Menu
3. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Main,
    Members,
    Attendance,
    Exit,
}

#[derive(Debug)]
pub enum ShellError {
    Io(io::Error),
    /// Input stream closed.
    EndOfInput,
    /// Connection rejected at startup.
    Repo(RepoError),
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "console I/O failed: {err}"),
            Self::EndOfInput => write!(f, "end of input"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ShellError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::EndOfInput => None,
        }
    }
}

impl From<io::Error> for ShellError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for ShellError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

/// Console front end over the registry and the ledger.
pub struct Shell<'conn, I, O> {
    registry: MemberService<SqliteMemberRepository<'conn>>,
    ledger: AttendanceService<SqliteAttendanceRepository<'conn>>,
    input: I,
    output: O,
}

impl<'conn, I: BufRead, O: Write> Shell<'conn, I, O> {
    pub fn try_new(
        conn: &'conn Connection,
        email_domain: &str,
        input: I,
        output: O,
    ) -> ShellResult<Self> {
        Ok(Self {
            registry: MemberService::with_email_domain(
                SqliteMemberRepository::try_new(conn)?,
                email_domain,
            ),
            ledger: AttendanceService::new(SqliteAttendanceRepository::try_new(conn)?),
            input,
            output,
        })
    }

    /// Runs menus until the operator exits or input ends.
    pub fn run(&mut self) -> ShellResult<()> {
        self.say("Welcome to the Club Member Tracker")?;
        self.warn_on_inconsistency()?;

        let mut screen = Screen::Main;
        while screen != Screen::Exit {
            screen = match self.step(screen) {
                Ok(next) => next,
                Err(ShellError::EndOfInput) => Screen::Exit,
                Err(err) => return Err(err),
            };
        }

        self.output.flush()?;
        Ok(())
    }

    pub fn into_output(self) -> O {
        self.output
    }

    fn step(&mut self, screen: Screen) -> ShellResult<Screen> {
        match screen {
            Screen::Main => self.main_menu(),
            Screen::Members => self.member_menu(),
            Screen::Attendance => self.attendance_menu(),
            Screen::Exit => Ok(Screen::Exit),
        }
    }

    fn main_menu(&mut self) -> ShellResult<Screen> {
        // The submenu opens even when its view fails to render.
        match self.prompt_choice(MAIN_MENU, 3)? {
            1 => {
                match self.registry.list() {
                    Ok(members) => self.say(render_members(&members))?,
                    Err(err) => self.report(err)?,
                }
                Ok(Screen::Members)
            }
            2 => {
                match self.ledger.list_attendance() {
                    Ok(records) => self.say(render_attendance(&records))?,
                    Err(err) => self.report(err)?,
                }
                Ok(Screen::Attendance)
            }
            _ => Ok(Screen::Exit),
        }
    }

    fn member_menu(&mut self) -> ShellResult<Screen> {
        match self.prompt_choice(MEMBER_MENU, 5)? {
            1 => self.add_member()?,
            2 => self.remove_member()?,
            3 => self.edit_member()?,
            4 => {}
            _ => return Ok(Screen::Exit),
        }
        Ok(Screen::Main)
    }

    fn attendance_menu(&mut self) -> ShellResult<Screen> {
        match self.prompt_choice(ATTENDANCE_MENU, 3)? {
            1 => self.take_attendance()?,
            2 => {}
            _ => return Ok(Screen::Exit),
        }
        Ok(Screen::Main)
    }

    fn add_member(&mut self) -> ShellResult<()> {
        let id = self.prompt_member_id()?;
        match self.registry.lookup(id) {
            Ok(Some(_)) => return self.report(RegistryError::Conflict(id)),
            Ok(None) => {}
            Err(err) => return self.report(err),
        }

        let domain = self.registry.email_domain().to_string();
        let input = NewMember {
            id,
            name: self.prompt_field("New Member Name > ", false, require("name"))?,
            grade: self.prompt_field("New Member Grade > ", false, parse_grade)?,
            status: self.prompt_field("New Member Club Status > ", false, require("status"))?,
            username: self.prompt_field(
                &format!("New Member Username (email ends in {domain}) > "),
                false,
                require("username"),
            )?,
            registered_paid: self.prompt_field(
                "Has the member registered and paid? ",
                false,
                require("registered_paid"),
            )?,
            money_owed: self.prompt_field("Money Owed By New Member ($) > ", false, parse_money)?,
            payment_method: self.prompt_field(
                "Payment Method > ",
                false,
                require("payment_method"),
            )?,
        };

        match self.registry.add(input) {
            Ok(member) => self.say(format!("Successfully added {}", member.name)),
            Err(err) => self.report(err),
        }
    }

    fn remove_member(&mut self) -> ShellResult<()> {
        let id = self.prompt_member_id()?;
        match self.registry.remove(id) {
            Ok(_) => self.say(format!("Successfully deleted {id}")),
            Err(err) => self.report(err),
        }
    }

    fn edit_member(&mut self) -> ShellResult<()> {
        let id = self.prompt_member_id()?;
        let current = match self.registry.lookup(id) {
            Ok(Some(member)) => member,
            Ok(None) => return self.report(RegistryError::NotFound(id)),
            Err(err) => return self.report(err),
        };

        self.say("Leave field blank for no changes, NOTE: Member ID can't be changed")?;
        let username = self.registry.current_username(&current).to_string();
        let edit = MemberEdit {
            name: self.prompt_field(
                &format!("New Name ({}) > ", current.name),
                true,
                require("name"),
            )?,
            grade: self.prompt_field(
                &format!("New Grade ({}) > ", current.grade),
                true,
                parse_grade,
            )?,
            status: self.prompt_field(
                &format!("New Club Status ({}) > ", current.status),
                true,
                require("status"),
            )?,
            username: self.prompt_field(
                &format!("New Username ({username}) > "),
                true,
                require("username"),
            )?,
            registered_paid: self.prompt_field(
                &format!("Has the member registered and paid? ({}) ", current.registered_paid),
                true,
                require("registered_paid"),
            )?,
            money_owed: self.prompt_field(
                &format!("Money Owed By Member ($) ({:.2}) > ", current.money_owed),
                true,
                parse_money,
            )?,
            payment_method: self.prompt_field(
                &format!("Payment Method ({}) > ", current.payment_method),
                true,
                require("payment_method"),
            )?,
        };

        match self.registry.edit(id, &edit) {
            Ok(_) => self.say(format!("Successfully edited {id}")),
            Err(err) => self.report(err),
        }
    }

    fn take_attendance(&mut self) -> ShellResult<()> {
        let slots = self.ledger.list_meeting_slots();
        let mut menu =
            String::from("Choose from options below for the meet attendance is being taken for");
        for slot in slots {
            menu.push_str(&format!("\n{}. {}", slot.index(), slot.label()));
        }
        let choice = self.prompt_choice(&menu, slots.len())?;
        let Some(slot) = MeetingSlot::from_index(choice) else {
            return self.say("Choose from the options above");
        };

        let roster = match self.ledger.roll_call() {
            Ok(roster) => roster,
            Err(err) => return self.report(err),
        };
        if roster.is_empty() {
            return self.say("No members on the roster");
        }

        let mut marks = BTreeMap::new();
        'roll: for entry in &roster {
            let prompt = format!("Did {} attend today's meeting? Y/n (q to stop) ", entry.name);
            loop {
                let answer = self.ask(&prompt)?;
                if answer.trim().eq_ignore_ascii_case("q") {
                    break 'roll;
                }
                match parse_response(&answer) {
                    Some(mark) => {
                        marks.insert(entry.member_id, mark);
                        break;
                    }
                    None => self.say("Answer y or n, or q to stop")?,
                }
            }
        }

        if marks.is_empty() {
            return self.say("No attendance recorded");
        }
        match self.ledger.record_meeting(slot, &marks) {
            Ok(written) if written < roster.len() => self.say(format!(
                "Recorded {} for {written} of {} members; the rest were left unchanged",
                slot.label(),
                roster.len()
            )),
            Ok(_) => self.say("Successfully taken attendance!"),
            Err(err) => self.report(err),
        }
    }

    fn warn_on_inconsistency(&mut self) -> ShellResult<()> {
        match self.ledger.check_consistency() {
            Ok(report) if !report.is_consistent() => self.say(format!(
                "Warning: {} member(s) have no attendance row and {} attendance row(s) have no member",
                report.members_without_attendance.len(),
                report.attendance_without_member.len()
            )),
            Ok(_) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    fn prompt_choice(&mut self, menu: &str, max: usize) -> ShellResult<usize> {
        self.say(menu)?;
        loop {
            let answer = self.ask("> ")?;
            match answer.trim().parse::<usize>() {
                Ok(choice) if (1..=max).contains(&choice) => return Ok(choice),
                Ok(_) => self.say("Enter a number from the menu")?,
                Err(_) => self.say("Enter a number please")?,
            }
        }
    }

    fn prompt_member_id(&mut self) -> ShellResult<MemberId> {
        let mut answer = self.ask("What is the member ID? ")?;
        loop {
            match answer.trim().parse::<MemberId>() {
                Ok(id) => return Ok(id),
                Err(_) => {
                    self.say("Enter a number please")?;
                    answer = self.ask("> ")?;
                }
            }
        }
    }

    /// Asks until `check` accepts the answer. With `allow_blank`, a blank
    /// answer is returned unchecked.
    fn prompt_field<T>(
        &mut self,
        prompt: &str,
        allow_blank: bool,
        check: impl Fn(&str) -> Result<T, MemberValidationError>,
    ) -> ShellResult<String> {
        let mut answer = self.ask(prompt)?;
        loop {
            if allow_blank && answer.trim().is_empty() {
                return Ok(answer);
            }
            match check(&answer) {
                Ok(_) => return Ok(answer),
                Err(err) => {
                    self.say(err)?;
                    answer = self.ask("> ")?;
                }
            }
        }
    }

    fn report(&mut self, err: impl Display) -> ShellResult<()> {
        warn!("event=shell_operation module=shell status=error error={err}");
        self.say(err)
    }

    fn ask(&mut self, prompt: &str) -> ShellResult<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ShellError::EndOfInput);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn say(&mut self, message: impl Display) -> ShellResult<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }
}

fn require(field: &'static str) -> impl Fn(&str) -> Result<(), MemberValidationError> {
    move |value: &str| {
        if value.trim().is_empty() {
            Err(MemberValidationError::BlankField(field))
        } else {
            Ok(())
        }
    }
}
