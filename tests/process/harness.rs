/*!
 * Shared setup for process lifecycle tests
 */

use proc_kernel::{
    ElfBuilder, Exited, KernelConfig, MemFs, Pid, ProcessManager, ProgramRegistry, SimVm,
    UserContext, VirtualMemory,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const INIT_ENTRY: u64 = 0x40_0000;
pub const PROG_ENTRY: u64 = 0x50_0000;
pub const TIMEOUT: Duration = Duration::from_secs(10);

pub struct Harness {
    pub kernel: ProcessManager,
    pub programs: ProgramRegistry,
    pub fs: Arc<MemFs>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default().with_max_frames(2048))
    }

    pub fn with_config(config: KernelConfig) -> Self {
        let vm = Arc::new(SimVm::new(config.max_frames));
        Self::with_vm(config, vm)
    }

    pub fn with_vm(config: KernelConfig, vm: Arc<dyn VirtualMemory>) -> Self {
        let programs = ProgramRegistry::new();
        let fs = Arc::new(MemFs::new());
        let kernel = ProcessManager::builder()
            .with_config(config)
            .with_vm(vm)
            .with_filesystem(fs.clone())
            .with_user_mode(Arc::new(programs.clone()))
            .build()
            .unwrap();
        Self {
            kernel,
            programs,
            fs,
        }
    }

    /// Install an executable whose entry point is `entry`
    pub fn install(&self, path: &str, entry: u64) {
        self.fs
            .add_file(path, ElfBuilder::text(entry, &[0u8; 16]))
            .unwrap();
    }

    pub fn register<F>(&self, pc: u64, program: F)
    where
        F: Fn(&mut UserContext<'_>) -> Exited + Send + Sync + 'static,
    {
        self.programs.register(pc, program);
    }

    /// Install `/sbin/init` running `program` and start it
    pub fn boot<F>(&self, program: F) -> Pid
    where
        F: Fn(&mut UserContext<'_>) -> Exited + Send + Sync + 'static,
    {
        self.install("/sbin/init", INIT_ENTRY);
        self.register(INIT_ENTRY, program);
        self.kernel.run_program("/sbin/init", &["init"]).unwrap()
    }

    pub fn wait_idle(&self) {
        assert!(
            self.kernel.wait_idle_timeout(TIMEOUT),
            "processes still running: {:?}",
            self.kernel.list_processes()
        );
    }

    /// Poll until `pid` has left the process table
    pub fn wait_removed(&self, pid: Pid) {
        let deadline = Instant::now() + TIMEOUT;
        while self.kernel.process_info(pid).is_some() {
            assert!(Instant::now() < deadline, "pid {pid} never left the table");
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Every frame is back in the pool and the table is empty
    pub fn assert_clean(&self) {
        let stats = self.kernel.memory_stats();
        assert_eq!(stats.free_frames, stats.total_frames);
        assert_eq!(stats.live_spaces, 0);
        assert!(self.kernel.table().is_empty());
    }
}
