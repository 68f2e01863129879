#[cfg(target_os = "macos")]
fn main() {
    use std::sync::Arc;

    use core_foundation::runloop::CFRunLoop;
    use docktoggle::agent::Agent;
    use docktoggle::apps::macos::WorkspaceDirectory;
    use docktoggle::config::Config;
    use docktoggle::dock::sampler::AxDockSampler;
    use docktoggle::permission::SystemPermissionProbe;
    use docktoggle::tap::macos::CgTapFactory;
    use docktoggle::windows::macos::AxWindowSource;
    use docktoggle::workspace::WorkspaceObserver;

    docktoggle::init_logging();
    let config = Config::load();
    tracing::info!(?config, "starting docktoggle");

    let agent = Agent::new(
        config,
        Box::new(SystemPermissionProbe),
        Box::new(AxDockSampler::new()),
        Arc::new(WorkspaceDirectory::new()),
        Arc::new(AxWindowSource::new()),
        Box::new(CgTapFactory::new()),
    );

    let _observer = WorkspaceObserver::install(agent.handle().events());
    let _agent_loop = agent.start();

    // Workspace notifications arrive on the main run loop; park here.
    CFRunLoop::run_current();
}

#[cfg(not(target_os = "macos"))]
fn main() {
    docktoggle::init_logging();
    tracing::error!("docktoggle drives the macOS dock and cannot run on this platform");
    std::process::exit(1);
}
