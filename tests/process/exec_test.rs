/*!
 * Exec Tests
 * Program replacement, argument passing, and failure modes
 */

use crate::harness::{Harness, INIT_ENTRY, PROG_ENTRY};
use pretty_assertions::assert_eq;
use proc_kernel::{
    AddrSpace, Errno, KernelConfig, KernelError, MemoryError, MemoryResult, MemoryStats, Pid,
    SimVm, UserPtr, VfsError, VirtualMemory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `SimVm` that refuses to create more than `budget` address spaces
struct CreateBudgetVm {
    inner: SimVm,
    budget: AtomicUsize,
}

impl CreateBudgetVm {
    fn new(max_frames: usize, budget: usize) -> Self {
        Self {
            inner: SimVm::new(max_frames),
            budget: AtomicUsize::new(budget),
        }
    }
}

impl VirtualMemory for CreateBudgetVm {
    fn create(&self) -> MemoryResult<AddrSpace> {
        self.budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| MemoryError::OutOfFrames {
                requested: 1,
                available: 0,
            })?;
        self.inner.create()
    }

    fn copy(&self, src: &AddrSpace) -> MemoryResult<AddrSpace> {
        self.inner.copy(src)
    }

    fn destroy(&self, space: AddrSpace) {
        self.inner.destroy(space)
    }

    fn activate(&self, space: &AddrSpace) {
        self.inner.activate(space)
    }

    fn deactivate(&self) {
        self.inner.deactivate()
    }

    fn stats(&self) -> MemoryStats {
        self.inner.stats()
    }
}

#[test]
fn test_exec_missing_path_leaves_caller_intact() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.boot(move |ctx| {
        let marker = ctx.stash_bytes(&0xFEEDu64.to_le_bytes()).unwrap();
        let pid = ctx.getpid();
        let path = ctx.stash_str("/bin/nope").unwrap();
        let argv = ctx.stash_argv(&["nope"]).unwrap();
        let result = ctx.execv(path, argv).map(|_| ());
        let intact = ctx.load_word(marker.addr()).unwrap() == 0xFEED && ctx.getpid() == pid;
        tx.send((result, intact)).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), (Err(Errno::ENOENT), true));
    h.assert_clean();
}

#[test]
fn test_exec_passes_arguments() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.install("/bin/args", PROG_ENTRY);
    h.register(PROG_ENTRY, move |ctx| {
        let tf = *ctx.trapframe();
        let (argc, argv) = ctx.args();
        let strings = ctx.argv().unwrap();
        let terminator = ctx.load_word(argv.offset(argc * 8).addr()).unwrap();
        tx.send((argc, strings, terminator, tf.sp, argv.addr())).unwrap();
        ctx.exit(0)
    });
    h.boot(|ctx| {
        let path = ctx.stash_str("/bin/args").unwrap();
        let argv = ctx.stash_argv(&["args", "one", "", "three words"]).unwrap();
        match ctx.execv(path, argv) {
            Ok(done) => done,
            Err(_) => ctx.exit(1),
        }
    });
    h.wait_idle();

    let (argc, strings, terminator, sp, argv) = rx.recv().unwrap();
    assert_eq!(argc, 4);
    assert_eq!(strings, vec!["args", "one", "", "three words"]);
    assert_eq!(terminator, 0);
    assert_eq!(sp % 16, 0);
    assert_eq!(sp, argv);
    h.assert_clean();
}

#[test]
fn test_exec_keeps_identity_and_parent() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.install("/bin/report", PROG_ENTRY);
    let report = tx.clone();
    h.register(PROG_ENTRY, move |ctx| {
        let me = ctx.getpid();
        report.send(("exec", me, ctx.kernel().process_info(me))).unwrap();
        ctx.exit(11)
    });
    h.register(INIT_ENTRY + 4, |ctx| {
        let path = ctx.stash_str("/bin/report").unwrap();
        let argv = ctx.stash_argv(&["report"]).unwrap();
        match ctx.execv(path, argv) {
            Ok(done) => done,
            Err(_) => ctx.exit(1),
        }
    });
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        let (reaped, status) = ctx.wait_child(child).unwrap();
        assert_eq!(reaped, child);
        tx.send(("init", Pid(status.exit_code() as u32), ctx.kernel().process_info(child)))
            .unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let (_, exec_pid, exec_info) = rx.recv().unwrap();
    let (_, exit_code, zombie) = rx.recv().unwrap();
    let exec_info = exec_info.unwrap();
    assert_eq!(exec_info.name, "report");
    assert_eq!(exit_code, Pid(11));
    assert_eq!(zombie.unwrap().pid, exec_pid);
    h.assert_clean();
}

#[test]
fn test_exec_argument_errors_are_recoverable() {
    let h = Harness::with_config(KernelConfig::default().with_arg_max(64));
    let (tx, rx) = flume::unbounded();

    h.install("/bin/true", PROG_ENTRY);
    h.fs.add_dir("/bin/dir").unwrap();
    h.boot(move |ctx| {
        let path = ctx.stash_str("/bin/true").unwrap();
        let dir = ctx.stash_str("/bin/dir").unwrap();
        let argv = ctx.stash_argv(&["true"]).unwrap();
        let long = "x".repeat(100);
        let big = ctx.stash_argv(&[long.as_str()]).unwrap();

        let results: Vec<Result<(), Errno>> = vec![
            ctx.execv(path, UserPtr::NULL).map(|_| ()),
            ctx.execv(UserPtr::NULL, argv).map(|_| ()),
            ctx.execv(path, UserPtr(0x1000)).map(|_| ()),
            ctx.execv(UserPtr(0x1000), argv).map(|_| ()),
            ctx.execv(path, big).map(|_| ()),
            ctx.execv(dir, argv).map(|_| ()),
        ];
        tx.send(results).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(
        rx.recv().unwrap(),
        vec![
            Err(Errno::EINVAL),
            Err(Errno::EFAULT),
            Err(Errno::EFAULT),
            Err(Errno::EFAULT),
            Err(Errno::E2BIG),
            Err(Errno::EISDIR),
        ]
    );
    h.assert_clean();
}

#[test]
fn test_exec_bad_image_is_fatal() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.fs.add_file("/bin/garbage", vec![0u8; 256]).unwrap();
    h.register(INIT_ENTRY + 4, |ctx| {
        let path = ctx.stash_str("/bin/garbage").unwrap();
        let argv = ctx.stash_argv(&["garbage"]).unwrap();
        match ctx.execv(path, argv) {
            Ok(done) => done,
            // unreachable: the process is gone once the old image is
            Err(_) => ctx.exit(1),
        }
    });
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        tx.send(ctx.wait_child(child).map(|(_, s)| s.exit_code()))
            .unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), Ok(Errno::ENOEXEC.code()));
    h.assert_clean();
}

#[test]
fn test_run_program_missing_file() {
    let h = Harness::new();
    let err = h.kernel.run_program("/sbin/missing", &["missing"]).unwrap_err();
    assert_eq!(err, KernelError::Vfs(VfsError::NotFound("/sbin/missing".into())));
    assert!(h.kernel.table().is_empty());
    assert_eq!(h.kernel.live_processes(), 0);
    h.assert_clean();
}

#[test]
fn test_run_program_too_many_arguments() {
    let h = Harness::with_config(KernelConfig::default().with_arg_max(32));
    h.install("/sbin/init", INIT_ENTRY);
    let err = h
        .kernel
        .run_program("/sbin/init", &["init", "a-rather-long-argument"])
        .unwrap_err();
    assert_eq!(err, KernelError::ArgumentListTooLong);
    assert!(h.kernel.table().is_empty());
}

#[test]
fn test_exec_large_argv_within_arg_max() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.install("/bin/args", PROG_ENTRY);
    h.register(PROG_ENTRY, move |ctx| {
        let strings = ctx.argv().unwrap();
        tx.send(strings.iter().map(String::len).collect::<Vec<_>>())
            .unwrap();
        ctx.exit(0)
    });
    h.boot(|ctx| {
        let long = "a".repeat(4000);
        let args = vec![long.as_str(); 15];
        let path = ctx.stash_str("/bin/args").unwrap();
        let argv = ctx.stash_argv(&args).unwrap();
        match ctx.execv(path, argv) {
            Ok(done) => done,
            Err(errno) => ctx.exit(errno.code()),
        }
    });
    h.wait_idle();

    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![vec![4000; 15]]);
    h.assert_clean();
}

#[test]
fn test_exec_without_memory_keeps_caller() {
    // one space for init; the new image cannot be created
    let config = KernelConfig::default().with_max_frames(2048);
    let vm = Arc::new(CreateBudgetVm::new(config.max_frames, 1));
    let h = Harness::with_vm(config, vm);
    let (tx, rx) = flume::unbounded();

    h.install("/bin/true", PROG_ENTRY);
    h.register(PROG_ENTRY, |ctx| ctx.exit(0));
    h.boot(move |ctx| {
        let marker = ctx.stash_bytes(&0xBEEFu64.to_le_bytes()).unwrap();
        let path = ctx.stash_str("/bin/true").unwrap();
        let argv = ctx.stash_argv(&["true"]).unwrap();
        let result = ctx.execv(path, argv).map(|_| ());
        let intact = ctx.load_word(marker.addr()) == Ok(0xBEEF);
        tx.send((result, intact)).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), (Err(Errno::ENOMEM), true));
    h.assert_clean();
}
