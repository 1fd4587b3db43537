//! Interpreter integration tests against a recording Runner.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::io::Write;

use boxfile_core::error::BoxfileError;
use boxfile_core::runner::Runner;
use boxfile_core::{run_from_reader, run_script};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Run {
        command: String,
        user: String,
    },
    Copy {
        src: String,
        dest: String,
        is_add: bool,
    },
}

/// Records every Runner call; optionally fails commands or rejects users.
#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<Call>>,
    last_vars: RefCell<HashMap<String, String>>,
    fail_commands: bool,
    unknown_users: Vec<String>,
}

impl Runner for RecordingRunner {
    fn run_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> boxfile_core::Result<()> {
        self.calls.borrow_mut().push(Call::Run {
            command: command.to_string(),
            user: user.to_string(),
        });
        *self.last_vars.borrow_mut() = vars.clone();
        if self.fail_commands {
            return Err(BoxfileError::Runner(format!(
                "command '{}' exited with code 1",
                command
            )));
        }
        Ok(())
    }

    fn copy_file(&self, src: &str, dest: &str, is_add: bool) -> boxfile_core::Result<()> {
        self.calls.borrow_mut().push(Call::Copy {
            src: src.to_string(),
            dest: dest.to_string(),
            is_add,
        });
        Ok(())
    }

    fn verify_user(&self, name: &str) -> boxfile_core::Result<()> {
        if self.unknown_users.iter().any(|u| u == name) {
            return Err(BoxfileError::Lookup(format!("unknown user: {}", name)));
        }
        Ok(())
    }
}

fn run(script: &str, runner: &RecordingRunner) -> boxfile_core::Result<()> {
    run_from_reader(Cursor::new(script.to_string()), runner, &HashMap::new())
}

fn run_with_args(
    script: &str,
    runner: &RecordingRunner,
    args: &HashMap<String, String>,
) -> boxfile_core::Result<()> {
    run_from_reader(Cursor::new(script.to_string()), runner, args)
}

#[test]
fn test_runner_receives_one_call_per_executing_instruction_in_order() {
    let runner = RecordingRunner::default();
    let script = "\
# header comment
FROM alpine:3.19
ARG NAME=world
ENV GREETING=hello
USER root

RUN echo one
COPY a.txt /dst/
ADD data /srv
RUN echo two
";
    run(script, &runner).unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(
        *calls,
        vec![
            Call::Run {
                command: "echo one".to_string(),
                user: "root".to_string(),
            },
            Call::Copy {
                src: "a.txt".to_string(),
                dest: "/dst/".to_string(),
                is_add: false,
            },
            Call::Copy {
                src: "data".to_string(),
                dest: "/srv".to_string(),
                is_add: true,
            },
            Call::Run {
                command: "echo two".to_string(),
                user: "root".to_string(),
            },
        ]
    );
}

#[test]
fn test_arg_predefined_beats_default_and_environment() {
    std::env::set_var("BOXTEST_PRECEDENCE", "envval");
    let runner = RecordingRunner::default();
    let mut args = HashMap::new();
    args.insert("BOXTEST_PRECEDENCE".to_string(), "override".to_string());

    run_with_args(
        "ARG BOXTEST_PRECEDENCE=default\nRUN echo ${BOXTEST_PRECEDENCE}\n",
        &runner,
        &args,
    )
    .unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo override".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_arg_script_default_beats_environment() {
    std::env::set_var("BOXTEST_DEFAULT", "envval");
    let runner = RecordingRunner::default();

    run("ARG BOXTEST_DEFAULT=fromscript\nRUN echo $BOXTEST_DEFAULT\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo fromscript".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_arg_falls_back_to_environment() {
    std::env::set_var("BOXTEST_ENVONLY", "from-env");
    let runner = RecordingRunner::default();

    run("ARG BOXTEST_ENVONLY\nRUN echo $BOXTEST_ENVONLY\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo from-env".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_arg_unset_resolves_empty() {
    let runner = RecordingRunner::default();

    run("ARG BOXTEST_NOWHERE_SET\nRUN echo [$BOXTEST_NOWHERE_SET]\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo []".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_arg_default_resolution_concrete_scenario() {
    // ARG FOO=bar with no override anywhere resolves to the script default.
    let runner = RecordingRunner::default();

    run("ARG FOO=bar\nRUN echo ${FOO}\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo bar".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_env_expansion_round_trip() {
    let runner = RecordingRunner::default();

    run(
        "ENV GREETING=\"hello world\"\nRUN echo ${GREETING}\n",
        &runner,
    )
    .unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo hello world".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_env_expands_at_assignment_time_not_retroactively() {
    let runner = RecordingRunner::default();

    run(
        "ENV A=1\nENV MSG=value-$A\nENV A=2\nRUN echo $MSG\n",
        &runner,
    )
    .unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo value-1".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_vars_passed_to_runner_include_builtins_and_script_vars() {
    let runner = RecordingRunner::default();

    run("ENV COLOR=blue\nRUN true\n", &runner).unwrap();

    let vars = runner.last_vars.borrow();
    assert_eq!(vars.get("COLOR"), Some(&"blue".to_string()));
    assert!(vars.contains_key("BUILDKIT_SYNTAX"));
    assert!(vars.contains_key("BUILD_DATE"));
}

#[test]
fn test_continuation_joined_before_dispatch() {
    let runner = RecordingRunner::default();

    run("RUN echo a && \\\n    echo b\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "echo a && echo b".to_string(),
            user: String::new(),
        }
    );
}

#[test]
fn test_unterminated_continuation_is_parse_error_after_prior_instructions() {
    let runner = RecordingRunner::default();

    let err = run("RUN echo one\nRUN echo two \\\n", &runner).unwrap_err();

    assert!(matches!(err, BoxfileError::Parse(_)));
    // Instructions fully processed before the open continuation still ran.
    assert_eq!(runner.calls.borrow().len(), 1);
}

#[test]
fn test_malformed_env_aborts_before_later_instructions() {
    let runner = RecordingRunner::default();

    let err = run("ENV NOEQUALS\nRUN echo never\n", &runner).unwrap_err();

    assert!(matches!(err, BoxfileError::Parse(_)));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_user_expanded_and_threaded_to_run() {
    let runner = RecordingRunner::default();

    run("ARG APP_USER=svc\nUSER ${APP_USER}\nRUN whoami\n", &runner).unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Run {
            command: "whoami".to_string(),
            user: "svc".to_string(),
        }
    );
}

#[test]
fn test_user_verification_failure_is_fatal() {
    let runner = RecordingRunner {
        unknown_users: vec!["ghost".to_string()],
        ..Default::default()
    };

    let err = run("USER ghost\nRUN echo never\n", &runner).unwrap_err();

    assert!(matches!(err, BoxfileError::Lookup(_)));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_failing_command_aborts_script() {
    let runner = RecordingRunner {
        fail_commands: true,
        ..Default::default()
    };

    let err = run("RUN false\nRUN echo never\n", &runner).unwrap_err();

    assert!(matches!(err, BoxfileError::Runner(_)));
    assert_eq!(runner.calls.borrow().len(), 1);
}

#[test]
fn test_copy_arguments_are_expanded() {
    let runner = RecordingRunner::default();

    run(
        "ENV SRC=app\nENV DEST=/srv/app\nCOPY ${SRC}/*.py $DEST\n",
        &runner,
    )
    .unwrap();

    assert_eq!(
        runner.calls.borrow()[0],
        Call::Copy {
            src: "app/*.py".to_string(),
            dest: "/srv/app".to_string(),
            is_add: false,
        }
    );
}

#[test]
fn test_from_and_unknown_instructions_do_not_reach_runner() {
    let runner = RecordingRunner::default();

    run("FROM fedora:41\nWORKDIR /app\nEXPOSE 8080\n", &runner).unwrap();

    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_run_script_reads_file() {
    let runner = RecordingRunner::default();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "RUN echo from-file").unwrap();

    run_script(file.path(), &runner, &HashMap::new()).unwrap();

    assert_eq!(runner.calls.borrow().len(), 1);
}

#[test]
fn test_run_script_missing_file_is_io_error() {
    let runner = RecordingRunner::default();

    let err = run_script(
        std::path::Path::new("/nonexistent/Boxfile"),
        &runner,
        &HashMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, BoxfileError::Io(_)));
    assert!(runner.calls.borrow().is_empty());
}
