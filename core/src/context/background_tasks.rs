use tokio::task::JoinHandle;

/// Periodic engine tasks. Each one is started and stopped on its own.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    pub section_monitor: Option<JoinHandle<()>>,
    pub delta_sampler: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn stop_section_monitor(&mut self) -> bool {
        abort(self.section_monitor.take())
    }

    pub fn stop_delta_sampler(&mut self) -> bool {
        abort(self.delta_sampler.take())
    }

    pub fn abort_all(&mut self) {
        self.stop_section_monitor();
        self.stop_delta_sampler();
    }

    pub fn section_monitor_running(&self) -> bool {
        self.section_monitor.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn delta_sampler_running(&self) -> bool {
        self.delta_sampler.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn abort(handle: Option<JoinHandle<()>>) -> bool {
    match handle {
        Some(handle) => {
            handle.abort();
            true
        }
        None => false,
    }
}
