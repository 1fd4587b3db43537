//! Runner construction and script dispatch.
//!
//! Owns everything the interpreter core does not: target selection,
//! credential collection, predefined-ARG parsing, and handing the
//! assembled Runner to the core entry points.

use std::collections::HashMap;

use boxfile_core::{
    run_from_reader, run_script, BoxfileError, LocalRunner, PodmanRunner, Result, Runner,
    SshRunner,
};

use crate::args::{parse_arg_value, parse_user_host, Cli};

/// Execute the requested script against the selected target.
pub fn execute(cli: Cli) -> Result<()> {
    let predefined_args = collect_predefined_args(&cli.args)?;
    let context = cli.execution_context();
    let runner = build_runner(&cli, &context)?;

    if cli.stdin {
        let stdin = std::io::stdin();
        run_from_reader(stdin.lock(), runner.as_ref(), &predefined_args)
    } else {
        run_script(&cli.file, runner.as_ref(), &predefined_args)
    }
}

/// Turn repeated `--arg KEY=VALUE` flags into the predefined-ARG mapping.
fn collect_predefined_args(flags: &[String]) -> Result<HashMap<String, String>> {
    let mut args = HashMap::new();
    for flag in flags {
        let (key, value) = parse_arg_value(flag).map_err(BoxfileError::Config)?;
        args.insert(key, value);
    }
    Ok(args)
}

/// Construct the Runner the flags select: SSH when a host is given,
/// container-exec when a container is given, local otherwise.
fn build_runner(cli: &Cli, context: &std::path::Path) -> Result<Box<dyn Runner>> {
    if let Some(host) = &cli.host {
        let (user_from_target, host) = match parse_user_host(host) {
            Some((user, host)) => (Some(user), host),
            None => (None, host.clone()),
        };

        let user = cli
            .user
            .clone()
            .or(user_from_target)
            .or_else(current_username)
            .ok_or_else(|| {
                BoxfileError::Config(
                    "cannot determine SSH user; pass --user".to_string(),
                )
            })?;

        let password = if cli.ask_password {
            let prompt = format!("Enter SSH password for {}@{}: ", user, host);
            Some(rpassword::prompt_password(prompt)?)
        } else {
            cli.password.clone()
        };

        let runner = SshRunner::new(
            context,
            host.clone(),
            user.clone(),
            cli.port,
            cli.key.clone(),
            password,
        )?;
        println!("Running on remote host {} as user {}", host, user);
        return Ok(Box::new(runner));
    }

    if let Some(container) = &cli.container {
        let runner = PodmanRunner::new(
            context,
            container.clone(),
            cli.connection.clone(),
            cli.podman_binary.clone(),
        );
        println!("Running in container {}", container);
        return Ok(Box::new(runner));
    }

    println!("Running locally");
    Ok(Box::new(LocalRunner::new(context)))
}

/// Name of the invoking user, from the user database or the environment.
fn current_username() -> Option<String> {
    // Safety: getpwuid returns a pointer into static storage or NULL; the
    // name is copied out immediately and the process is single-threaded at
    // this point.
    unsafe {
        let pw = libc::getpwuid(libc::getuid());
        if !pw.is_null() {
            if let Ok(name) = std::ffi::CStr::from_ptr((*pw).pw_name).to_str() {
                return Some(name.to_string());
            }
        }
    }
    std::env::var("USER").ok().filter(|u| !u.is_empty())
}
