// builtins.rs

use crate::error::{BuiltinError, JobError, ReplayError};
use crate::history::HistoryStore;
use crate::jobs::JobTable;
use crate::util::{expand_tilde, find_executable, writeln_ignore_broken_pipe};
use std::env;
use std::io::Write;

/// Names the shell handles itself. The replay family (`r`, `r<c>`) is
/// matched separately in [`classify`].
pub const BUILTIN_NAMES: [&str; 7] = ["exit", "history", "cd", "pwd", "jobs", "fg", "r"];

/// A command line the shell runs without forking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin<'a> {
    Exit(Option<&'a str>),
    History(Option<&'a str>),
    Cd(Option<&'a str>),
    Pwd,
    Jobs,
    Fg(Option<&'a str>),
    /// `r` replays the newest command; `r <c>` and `r<c>` the newest one
    /// starting with `c`.
    Replay(Option<&'a str>),
}

impl Builtin<'_> {
    /// Whether the command line itself goes into history.
    pub fn is_recorded(&self) -> bool {
        matches!(self, Builtin::Cd(_) | Builtin::Pwd)
    }
}

/// Whether `r` words may be read as replay requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// A line typed by the user.
    Allowed,
    /// A command pulled out of history; it is never replayed again.
    Disabled,
}

/// Recognizes a built-in from the first argument.
///
/// A two-character word starting with `r` is a replay request only when no
/// program of that name is on `PATH`, so `rm` still runs `rm`. With
/// [`ReplayMode::Disabled`] neither `r` form is a built-in.
pub fn classify(args: &[String], mode: ReplayMode) -> Option<Builtin<'_>> {
    let name = args.first()?.as_str();
    let arg = args.get(1).map(String::as_str);
    let builtin = match name {
        "exit" => Builtin::Exit(arg),
        "history" => Builtin::History(arg),
        "cd" => Builtin::Cd(arg),
        "pwd" => Builtin::Pwd,
        "jobs" => Builtin::Jobs,
        "fg" => Builtin::Fg(arg),
        "r" if mode == ReplayMode::Allowed => Builtin::Replay(arg),
        _ if mode == ReplayMode::Disabled => return None,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some('r'), Some(_), None) if find_executable(name).is_none() => {
                    Builtin::Replay(Some(&name[1..]))
                }
                _ => return None,
            }
        }
    };
    Some(builtin)
}

/// Rejects arguments past the ones `builtin` takes.
pub fn check_arity(builtin: &Builtin<'_>, args: &[String]) -> Result<(), BuiltinError> {
    let max = match builtin {
        Builtin::Pwd | Builtin::Jobs => 0,
        // `r<c>` carries its prefix in the first word.
        Builtin::Replay(_) if args[0] != "r" => 0,
        _ => 1,
    };
    if args.len() > max + 1 {
        return Err(BuiltinError::TooManyArguments(args[0].clone()));
    }
    Ok(())
}

/// Turns the text after `r` into the prefix character to search for.
pub fn replay_prefix(text: Option<&str>) -> Result<Option<char>, ReplayError> {
    let Some(text) = text else {
        return Ok(None);
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(ReplayError::BadPrefix(text.to_string())),
    }
}

pub fn parse_exit_code(arg: Option<&str>) -> Result<i32, BuiltinError> {
    match arg {
        None => Ok(0),
        Some(code) => code
            .parse::<i32>()
            .map_err(|_| BuiltinError::BadExitCode(code.to_string())),
    }
}

pub fn parse_selector(arg: Option<&str>) -> Result<usize, JobError> {
    let arg = arg.ok_or(JobError::MissingSelector)?;
    arg.trim_start_matches('%')
        .parse::<usize>()
        .map_err(|_| JobError::BadSelector(arg.to_string()))
}

/// `cd [dir]`: no argument goes to `$HOME`, `~` and `~/...` expand to it.
pub fn change_dir(target: Option<&str>) -> Result<(), BuiltinError> {
    let home = env::var("HOME").ok();
    let target = match target {
        Some(t) => expand_tilde(t, home.as_deref()),
        None => home.ok_or(BuiltinError::NoHome)?,
    };
    env::set_current_dir(&target).map_err(|source| BuiltinError::ChangeDir { path: target, source })
}

pub fn print_working_dir<W: Write>(out: &mut W) -> Result<(), BuiltinError> {
    let path = env::current_dir().map_err(BuiltinError::WorkingDir)?;
    let _ = writeln_ignore_broken_pipe(out, path.display().to_string());
    Ok(())
}

/// `history [n]`: every entry, or the newest `n`, oldest first.
pub fn list_history<W: Write>(store: &HistoryStore, count: Option<&str>, out: &mut W) -> Result<(), BuiltinError> {
    let entries = match count {
        None => store.list(),
        Some(n) => {
            let n = n
                .parse::<usize>()
                .map_err(|_| BuiltinError::BadHistoryCount(n.to_string()))?;
            store.tail(n)
        }
    };
    for entry in entries {
        let _ = writeln_ignore_broken_pipe(&mut *out, entry.to_string());
    }
    Ok(())
}

/// `jobs`: polls every job and prints one line per record.
pub fn list_jobs<W: Write>(table: &mut JobTable, out: &mut W) {
    for job in table.poll_all() {
        let _ = writeln_ignore_broken_pipe(&mut *out, job.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Outcome;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn classifies_builtins() {
        assert_eq!(classify(&argv("exit 3"), ReplayMode::Allowed), Some(Builtin::Exit(Some("3"))));
        assert_eq!(classify(&argv("history"), ReplayMode::Allowed), Some(Builtin::History(None)));
        assert_eq!(classify(&argv("cd /tmp"), ReplayMode::Allowed), Some(Builtin::Cd(Some("/tmp"))));
        assert_eq!(classify(&argv("pwd"), ReplayMode::Allowed), Some(Builtin::Pwd));
        assert_eq!(classify(&argv("jobs"), ReplayMode::Allowed), Some(Builtin::Jobs));
        assert_eq!(classify(&argv("fg 0"), ReplayMode::Allowed), Some(Builtin::Fg(Some("0"))));
        assert_eq!(classify(&argv("ls -l"), ReplayMode::Allowed), None);
        assert_eq!(classify(&[], ReplayMode::Allowed), None);
    }

    #[test]
    fn replay_forms() {
        assert_eq!(classify(&argv("r"), ReplayMode::Allowed), Some(Builtin::Replay(None)));
        assert_eq!(classify(&argv("r l"), ReplayMode::Allowed), Some(Builtin::Replay(Some("l"))));
        assert_eq!(classify(&argv("rq"), ReplayMode::Allowed), Some(Builtin::Replay(Some("q"))));
    }

    #[test]
    fn history_commands_are_never_replays() {
        assert_eq!(classify(&argv("r"), ReplayMode::Disabled), None);
        assert_eq!(classify(&argv("r l"), ReplayMode::Disabled), None);
        assert_eq!(classify(&argv("rq"), ReplayMode::Disabled), None);
        assert_eq!(classify(&argv("pwd"), ReplayMode::Disabled), Some(Builtin::Pwd));
    }

    #[test]
    fn extra_arguments_are_rejected() {
        for line in ["r l extra", "rq extra", "fg 0 junk", "exit 1 2", "cd a b", "pwd x", "jobs x", "history 1 2"] {
            let args = argv(line);
            let builtin = classify(&args, ReplayMode::Allowed).unwrap();
            let err = check_arity(&builtin, &args).unwrap_err();
            assert_eq!(err.to_string(), format!("{}: too many arguments", args[0]));
        }
        for line in ["r", "r l", "rq", "fg 0", "exit 1", "cd", "pwd", "history 3"] {
            let args = argv(line);
            let builtin = classify(&args, ReplayMode::Allowed).unwrap();
            assert!(check_arity(&builtin, &args).is_ok(), "{} should be accepted", line);
        }
    }

    #[test]
    fn programs_starting_with_r_are_not_replays() {
        // `rm` lives on every system these tests run on.
        assert_eq!(classify(&argv("rm -f x"), ReplayMode::Allowed), None);
        assert_eq!(classify(&argv("readlink x"), ReplayMode::Allowed), None);
    }

    #[test]
    fn replay_prefix_must_be_one_character() {
        assert_eq!(replay_prefix(None), Ok(None));
        assert_eq!(replay_prefix(Some("l")), Ok(Some('l')));
        assert_eq!(
            replay_prefix(Some("ls")),
            Err(ReplayError::BadPrefix("ls".into()))
        );
    }

    #[test]
    fn exit_codes_and_selectors() {
        assert_eq!(parse_exit_code(None).unwrap(), 0);
        assert_eq!(parse_exit_code(Some("7")).unwrap(), 7);
        assert!(matches!(parse_exit_code(Some("x")), Err(BuiltinError::BadExitCode(_))));
        assert_eq!(parse_selector(Some("2")), Ok(2));
        assert_eq!(parse_selector(Some("%1")), Ok(1));
        assert_eq!(parse_selector(None), Err(JobError::MissingSelector));
        assert_eq!(parse_selector(Some("a")), Err(JobError::BadSelector("a".into())));
    }

    #[test]
    fn cd_to_missing_directory_fails() {
        let err = change_dir(Some("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().starts_with("cd: /definitely/not/here:"));
    }

    #[test]
    fn history_listing() {
        let mut store = HistoryStore::new();
        store.record(&argv("ls -la"), Outcome::Success, false).unwrap();
        store.record(&argv("pwd"), Outcome::Success, false).unwrap();
        store.record(&argv("false"), Outcome::Failed, false).unwrap();

        let mut out = Vec::new();
        list_history(&store, None, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "    0  ls -la\n    1  pwd\n    2  false\n"
        );

        let mut out = Vec::new();
        list_history(&store, Some("1"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "    2  false\n");

        let mut out = Vec::new();
        assert!(list_history(&store, Some("many"), &mut out).is_err());
    }

    #[test]
    fn pwd_prints_current_dir() {
        let mut out = Vec::new();
        print_working_dir(&mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.trim_end(), env::current_dir().unwrap().display().to_string());
    }
}
