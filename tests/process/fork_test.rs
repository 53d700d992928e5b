/*!
 * Fork Tests
 * Child identity, register state, and address-space copying
 */

use crate::harness::{Harness, INIT_ENTRY};
use pretty_assertions::assert_eq;
use proc_kernel::{Errno, KernelConfig, Pid};
use std::collections::HashSet;

#[test]
fn test_fork_returns_unique_live_pids() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    // Each fork site is one instruction after the previous one
    for site in 1..=4 {
        let tx = tx.clone();
        h.register(INIT_ENTRY + site * 4, move |ctx| {
            let tf = *ctx.trapframe();
            tx.send(("child", ctx.getpid(), tf.v0, tf.a3)).unwrap();
            ctx.exit(0)
        });
    }
    let parent_tx = tx.clone();
    let init = h.boot(move |ctx| {
        let mut children = Vec::new();
        for _ in 0..4 {
            let child = ctx.fork().unwrap();
            let tf = *ctx.trapframe();
            parent_tx.send(("parent", child, tf.v0, tf.a3)).unwrap();
            children.push(child);
        }
        for child in children {
            ctx.wait_child(child).unwrap();
        }
        ctx.exit(0)
    });
    h.wait_idle();

    let reports: Vec<_> = rx.try_iter().collect();
    let from_parent: Vec<_> = reports.iter().filter(|r| r.0 == "parent").collect();
    let from_children: Vec<_> = reports.iter().filter(|r| r.0 == "child").collect();
    assert_eq!(from_parent.len(), 4);
    assert_eq!(from_children.len(), 4);

    // Parent sees v0 = child pid, a3 = 0
    for (_, child, v0, a3) in &from_parent {
        assert_eq!(*v0, u64::from(*child));
        assert_eq!(*a3, 0);
    }
    // Child sees v0 = 0, a3 = 0
    for (_, _, v0, a3) in &from_children {
        assert_eq!((*v0, *a3), (0, 0));
    }

    let parent_view: HashSet<Pid> = from_parent.iter().map(|r| r.1).collect();
    let child_view: HashSet<Pid> = from_children.iter().map(|r| r.1).collect();
    assert_eq!(parent_view.len(), 4);
    assert_eq!(parent_view, child_view);
    assert!(!parent_view.contains(&init));
    h.assert_clean();
}

#[test]
fn test_child_resumes_after_fork_site() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    let child_tx = tx.clone();
    h.register(INIT_ENTRY + 4, move |ctx| {
        child_tx.send(("child", ctx.trapframe().pc)).unwrap();
        ctx.exit(0)
    });
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        tx.send(("parent", ctx.trapframe().pc)).unwrap();
        ctx.wait_child(child).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let mut reports: Vec<_> = rx.try_iter().collect();
    reports.sort();
    assert_eq!(
        reports,
        vec![("child", INIT_ENTRY + 4), ("parent", INIT_ENTRY + 4)]
    );
}

#[test]
fn test_child_gets_private_copy_of_memory() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    let child_tx = tx.clone();
    h.register(INIT_ENTRY + 4, move |ctx| {
        let slot = ctx.trapframe().v1;
        let inherited = ctx.load_word(slot).unwrap();
        ctx.store_word(slot, 0xBAD).unwrap();
        child_tx.send(("child", inherited)).unwrap();
        ctx.exit(0)
    });
    h.boot(move |ctx| {
        let slot = ctx.stash_bytes(&0x1234u64.to_le_bytes()).unwrap().addr();
        // hand the address to the child through a register fork leaves alone
        ctx.trapframe_mut().v1 = slot;
        let child = ctx.fork().unwrap();
        ctx.wait_child(child).unwrap();
        tx.send(("parent", ctx.load_word(slot).unwrap())).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let mut reports: Vec<_> = rx.try_iter().collect();
    reports.sort();
    assert_eq!(reports, vec![("child", 0x1234), ("parent", 0x1234)]);
}

#[test]
fn test_fork_fails_when_table_full() {
    let h = Harness::with_config(
        KernelConfig::default()
            .with_pid_range(2, 3)
            .with_max_frames(256),
    );
    let (tx, rx) = flume::unbounded();

    h.register(INIT_ENTRY + 4, |ctx| ctx.exit(0));
    h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        // the exited child stays in the table while we live
        let second = ctx.fork();
        ctx.wait_child(child).unwrap();
        tx.send(second).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), Err(Errno::ENPROC));
    h.assert_clean();
}

#[test]
fn test_fork_fails_without_memory() {
    // init needs one text page and two stack pages; a copy does not fit
    let h = Harness::with_config(
        KernelConfig::default()
            .with_stack_pages(2)
            .with_arg_max(4096)
            .with_max_frames(4),
    );
    let (tx, rx) = flume::unbounded();

    h.boot(move |ctx| {
        let result = ctx.fork();
        let resident = ctx.kernel().list_processes().len();
        tx.send((result, resident)).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    assert_eq!(rx.recv().unwrap(), (Err(Errno::ENOMEM), 1));
    h.assert_clean();
}

#[test]
fn test_child_inherits_parent_link() {
    let h = Harness::new();
    let (tx, rx) = flume::unbounded();

    h.register(INIT_ENTRY + 4, |ctx| ctx.exit(0));
    let init = h.boot(move |ctx| {
        let child = ctx.fork().unwrap();
        tx.send(ctx.kernel().process_info(child)).unwrap();
        ctx.wait_child(child).unwrap();
        ctx.exit(0)
    });
    h.wait_idle();

    let info = rx.recv().unwrap().unwrap();
    assert_eq!(info.parent, Some(init));
    assert_eq!(info.name, "init");
}
