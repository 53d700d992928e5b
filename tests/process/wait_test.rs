/*!
 * Wait Tests
 * waitpid validation order, repeatability, and deferred removal
 */

use crate::harness::{Harness, INIT_ENTRY, PROG_ENTRY};
use pretty_assertions::assert_eq;
use proc_kernel::{Errno, KernelConfig, Pid, ProcessState, UserPtr};

#[test]
fn test_wait_twice_returns_same_status() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.register(INIT_ENTRY + 4, |ctx| ctx.exit(7));
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        let first = ctx.wait_child(child);
        let second = ctx.wait_child(child);
        tx.send((child, first, second)).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let (child, first, second) = rx.recv().unwrap();
    let (reaped, status) = first.unwrap();
    assert_eq!(reaped, child);
    assert!(status.exited());
    assert_eq!(status.exit_code(), 7);
    assert_eq!(status.raw(), 7 << 2);
    assert_eq!(second.unwrap(), (reaped, status));
    h.assert_clean();
}

#[test]
fn test_wait_blocks_until_child_exits() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();
    let (gate_tx, gate_rx) = flume::bounded::<()>(0);

    h.register(INIT_ENTRY + 4, move |ctx| {
        gate_rx.recv().unwrap();
        ctx.exit(42)
    });
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        tx.send(None).unwrap();
        let result = ctx.wait_child(child).map(|(_, status)| status.exit_code());
        tx.send(Some(result)).unwrap();
        ctx.exit(0)
    });

    assert_eq!(rx.recv().unwrap(), None);
    // parent is parked in waitpid; nothing more arrives until the child goes
    assert!(rx.recv_timeout(std::time::Duration::from_millis(50)).is_err());
    gate_tx.send(()).unwrap();
    assert_eq!(rx.recv().unwrap(), Some(Ok(42)));
    h.wait_idle();
}

#[test]
fn test_wait_rejects_non_children() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();
    let (sibling_tx, sibling_rx) = flume::unbounded::<Pid>();
    let (gate_tx, gate_rx) = flume::unbounded::<()>();

    // first child: try to wait on its live sibling, its parent, and itself
    let report = tx.clone();
    h.register(INIT_ENTRY + 4, move |ctx| {
        let sibling = sibling_rx.recv().unwrap();
        let status = ctx.stash_bytes(&[0u8; 8]).unwrap();
        let me = ctx.getpid();
        let parent = ctx.kernel().process_info(me).unwrap().parent.unwrap();
        report
            .send(vec![
                ctx.waitpid(sibling, status, 0),
                ctx.waitpid(parent, status, 0),
                ctx.waitpid(me, status, 0),
            ])
            .unwrap();
        ctx.exit(0)
    });
    // second child: stays alive until released
    h.register(INIT_ENTRY + 8, move |ctx| {
        gate_rx.recv().unwrap();
        ctx.exit(0)
    });
    h.boot(move |ctx| {
        let first = ctx.fork().unwrap();
        let second = ctx.fork().unwrap();
        sibling_tx.send(second).unwrap();
        ctx.wait_child(first).unwrap();
        gate_tx.send(()).unwrap();
        ctx.wait_child(second).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let results = rx.recv().unwrap();
    assert_eq!(results, vec![Err(Errno::ECHILD); 3]);
}

#[test]
fn test_wait_nonexistent_pid() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.boot(move |ctx| {
        let status = ctx.stash_bytes(&[0u8; 8]).unwrap();
        tx.send(ctx.waitpid(Pid(9999), status, 0)).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), Err(Errno::ESRCH));
}

#[test]
fn test_wait_checks_in_order_before_blocking() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();
    let (gate_tx, gate_rx) = flume::unbounded::<()>();

    h.register(INIT_ENTRY + 4, move |ctx| {
        gate_rx.recv().unwrap();
        ctx.exit(0)
    });
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        let status = ctx.stash_bytes(&[0u8; 8]).unwrap();
        let me = ctx.getpid();
        let results = vec![
            // options come first, even for a pid that does not exist
            ctx.waitpid(Pid(9999), UserPtr::NULL, 5),
            // existence before the pointer
            ctx.waitpid(Pid(9999), UserPtr::NULL, 0),
            // parentage before the pointer
            ctx.waitpid(me, UserPtr::NULL, 0),
            // live child: all of these return without waiting for it
            ctx.waitpid(child, status, 1),
            ctx.waitpid(child, UserPtr::NULL, 0),
            ctx.waitpid(child, UserPtr(0x1000), 0),
        ];
        tx.send(results).unwrap();
        gate_tx.send(()).unwrap();
        ctx.wait_child(child).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(
        rx.recv().unwrap(),
        vec![
            Err(Errno::EINVAL),
            Err(Errno::ESRCH),
            Err(Errno::ECHILD),
            Err(Errno::EINVAL),
            Err(Errno::EFAULT),
            Err(Errno::EFAULT),
        ]
    );
}

#[test]
fn test_wait_rejects_read_only_status_pointer() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.register(INIT_ENTRY + 4, |ctx| ctx.exit(0));
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        // program text is mapped read/execute
        let rejected = ctx.waitpid(child, UserPtr(INIT_ENTRY), 0);
        let reaped = ctx.wait_child(child).map(|(pid, _)| pid);
        tx.send((rejected, reaped == Ok(child))).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), (Err(Errno::EFAULT), true));
}

#[test]
fn test_zombie_resolvable_until_parent_exits() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.register(INIT_ENTRY + 4, |ctx| ctx.exit(3));
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        ctx.wait_child(child).unwrap();
        tx.send((child, ctx.kernel().process_info(child))).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let (child, info) = rx.recv().unwrap();
    let info = info.unwrap();
    assert_eq!(info.state, ProcessState::Zombie);
    assert_eq!(info.exit_status.map(|s| s.exit_code()), Some(3));
    assert!(h.kernel.process_info(child).is_none());
    h.assert_clean();
}

#[test]
fn test_orphan_removed_after_parent_exit() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();
    let (gate_tx, gate_rx) = flume::unbounded::<()>();

    h.register(INIT_ENTRY + 4, move |ctx| {
        gate_rx.recv().unwrap();
        ctx.exit(9)
    });
    let init = h.boot(move |ctx| {
        tx.send(ctx.fork().unwrap()).unwrap();
        ctx.exit(0)
    });

    let child = rx.recv().unwrap();
    h.wait_removed(init);
    assert_eq!(
        h.kernel.process_info(child).map(|info| info.state),
        Some(ProcessState::Running)
    );

    gate_tx.send(()).unwrap();
    h.wait_idle();
    assert!(h.kernel.process_info(child).is_none());
    h.assert_clean();
}

#[test]
fn test_all_deferred_children_released_together() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();
    let (gate_tx, gate_rx) = flume::unbounded::<()>();

    for site in 1..=5u64 {
        h.register(INIT_ENTRY + site * 4, move |ctx| ctx.exit(site as i32));
    }
    h.boot(move |ctx| {
        let children: Vec<Pid> = (0..5).map(|_| ctx.fork().unwrap()).collect();
        for &child in &children {
            ctx.wait_child(child).unwrap();
        }
        tx.send(ctx.kernel().list_processes()).unwrap();
        gate_rx.recv().unwrap();
        ctx.exit(0)
    });

    let listing = rx.recv().unwrap();
    assert_eq!(listing.len(), 6);
    assert_eq!(
        listing
            .iter()
            .filter(|info| info.state == ProcessState::Zombie)
            .count(),
        5
    );

    gate_tx.send(()).unwrap();
    h.wait_idle();
    h.assert_clean();
}

#[test]
fn test_reused_pid_is_not_the_parent() {
    // two pids: the parent's pid is handed to an unrelated process
    let h = Harness::with_config(
        KernelConfig::default()
            .with_pid_range(2, 3)
            .with_max_frames(256),
    );
    let (tx, rx) = flume::unbounded();
    let (gate_tx, gate_rx) = flume::unbounded::<()>();

    h.register(INIT_ENTRY + 4, move |ctx| {
        gate_rx.recv().unwrap();
        ctx.exit(0)
    });
    let forked = tx.clone();
    let first = h.boot(move |ctx| {
        forked.send(Ok(ctx.fork().unwrap())).unwrap();
        ctx.exit(0)
    });
    let orphan = rx.recv().unwrap().unwrap();
    h.wait_removed(first);

    h.install("/bin/stranger", PROG_ENTRY);
    h.register(PROG_ENTRY, move |ctx| {
        let status = ctx.stash_bytes(&[0u8; 8]).unwrap();
        tx.send(ctx.waitpid(orphan, status, 0)).unwrap();
        ctx.exit(0)
    });
    let stranger = h.kernel.run_program("/bin/stranger", &["stranger"]).unwrap();
    assert_eq!(stranger, first);
    assert_eq!(rx.recv().unwrap(), Err(Errno::ECHILD));
    h.wait_removed(stranger);

    // the orphan does not wait on the stranger's reap channel
    gate_tx.send(()).unwrap();
    h.wait_idle();
    h.assert_clean();
}
