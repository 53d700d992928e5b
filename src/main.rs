/*!
 * Process Kernel - Demo Entry Point
 *
 * Boots an init program that forks a child, waits for it twice, then
 * replaces itself with `/bin/echo`.
 */

use miette::IntoDiagnostic;
use proc_kernel::{
    init_tracing, ElfBuilder, KernelConfig, MemFs, ProcessManager, ProgramRegistry, UserContext,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const INIT_ENTRY: u64 = 0x40_0000;
const ECHO_ENTRY: u64 = 0x50_0000;

fn init(ctx: &mut UserContext<'_>) -> proc_kernel::Exited {
    let pid = ctx.getpid();
    info!(pid = %pid, "init running");

    let child = match ctx.fork() {
        Ok(child) => child,
        Err(errno) => {
            error!(%errno, "fork failed");
            return ctx.exit(1);
        }
    };

    for round in 1..=2 {
        match ctx.wait_child(child) {
            Ok((reaped, status)) => {
                info!(round, child = %reaped, code = status.exit_code(), "child reaped")
            }
            Err(errno) => error!(round, %errno, "waitpid failed"),
        }
    }

    let staged = ctx
        .stash_str("/bin/echo")
        .and_then(|path| Ok((path, ctx.stash_argv(&["echo", "hello", "from", "exec"])?)));
    let (path, argv) = match staged {
        Ok(staged) => staged,
        Err(e) => {
            error!(error = %e, "could not stage exec arguments");
            return ctx.exit(1);
        }
    };
    match ctx.execv(path, argv) {
        Ok(done) => done,
        Err(errno) => {
            error!(%errno, "execv failed");
            ctx.exit(1)
        }
    }
}

fn child(ctx: &mut UserContext<'_>) -> proc_kernel::Exited {
    info!(pid = %ctx.getpid(), "child running");
    ctx.exit(7)
}

fn echo(ctx: &mut UserContext<'_>) -> proc_kernel::Exited {
    match ctx.argv() {
        Ok(args) => {
            info!(line = %args.iter().skip(1).cloned().collect::<Vec<_>>().join(" "), "echo");
            ctx.exit(0)
        }
        Err(e) => {
            error!(error = %e, "echo could not read argv");
            ctx.exit(1)
        }
    }
}

fn main() -> miette::Result<()> {
    init_tracing();
    info!("Process kernel starting...");

    let config = KernelConfig::from_env();

    let fs = Arc::new(MemFs::new());
    fs.add_file("/sbin/init", ElfBuilder::text(INIT_ENTRY, &[0u8; 16]))
        .into_diagnostic()?;
    fs.add_file("/bin/echo", ElfBuilder::text(ECHO_ENTRY, &[0u8; 16]))
        .into_diagnostic()?;

    let programs = ProgramRegistry::new();
    programs.register(INIT_ENTRY, init);
    programs.register(INIT_ENTRY + 4, child);
    programs.register(ECHO_ENTRY, echo);

    let kernel = ProcessManager::builder()
        .with_config(config)
        .with_filesystem(fs)
        .with_user_mode(Arc::new(programs))
        .build()
        .into_diagnostic()?;

    let init_pid = kernel.run_program("/sbin/init", &["init"])?;
    info!(pid = %init_pid, "init started");

    if !kernel.wait_idle_timeout(Duration::from_secs(10)) {
        error!(live = kernel.live_processes(), "processes still running at shutdown");
    }

    let listing = serde_json::to_string_pretty(&kernel.list_processes()).into_diagnostic()?;
    println!("{listing}");
    let stats = kernel.memory_stats();
    info!(
        free_frames = stats.free_frames,
        total_frames = stats.total_frames,
        "Process kernel stopped"
    );
    Ok(())
}
