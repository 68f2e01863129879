//! End-to-end decision pipeline over fake collaborators: sampled dock
//! geometry feeds the disambiguator, whose verdict drives the window toggle.

use std::sync::{Arc, Mutex};

use docktoggle::apps::AppInfo;
use docktoggle::click::{decide, Verdict};
use docktoggle::dock::cache::GeometryCache;
use docktoggle::dock::{DockSampler, GeometryError, IconRegion, Point, Rect};
use docktoggle::windows::{toggle_windows, ToggleOutcome, WindowError, WindowHandle, WindowSource};

struct StaticDock(Vec<IconRegion>);

impl DockSampler for StaticDock {
    fn sample(&self) -> Result<Vec<IconRegion>, GeometryError> {
        Ok(self.0.clone())
    }
}

struct BrokenDock;

impl DockSampler for BrokenDock {
    fn sample(&self) -> Result<Vec<IconRegion>, GeometryError> {
        Err(GeometryError::DockNotRunning)
    }
}

struct FakeWindow {
    states: Arc<Mutex<Vec<bool>>>,
    index: usize,
}

impl WindowHandle for FakeWindow {
    fn is_minimized(&self) -> Result<bool, WindowError> {
        Ok(self.states.lock().unwrap()[self.index])
    }

    fn set_minimized(&self, minimized: bool) -> Result<(), WindowError> {
        self.states.lock().unwrap()[self.index] = minimized;
        Ok(())
    }
}

struct FakeWindows {
    states: Arc<Mutex<Vec<bool>>>,
}

impl FakeWindows {
    fn new(minimized: &[bool]) -> Self {
        Self {
            states: Arc::new(Mutex::new(minimized.to_vec())),
        }
    }

    fn snapshot(&self) -> Vec<bool> {
        self.states.lock().unwrap().clone()
    }
}

impl WindowSource for FakeWindows {
    fn windows(&self, _pid: i32) -> Result<Vec<Box<dyn WindowHandle>>, WindowError> {
        let count = self.states.lock().unwrap().len();
        Ok((0..count)
            .map(|index| {
                Box::new(FakeWindow {
                    states: Arc::clone(&self.states),
                    index,
                }) as Box<dyn WindowHandle>
            })
            .collect())
    }
}

fn dock_row() -> Vec<IconRegion> {
    vec![
        IconRegion::new(Rect::new(0.0, 1040.0, 64.0, 64.0), "Finder"),
        IconRegion::new(Rect::new(64.0, 1040.0, 64.0, 64.0), "Safari"),
        IconRegion::new(Rect::new(128.0, 1040.0, 64.0, 64.0), "Mail"),
    ]
}

#[test]
fn click_on_frontmost_app_collapses_then_restores_it() {
    let cache = GeometryCache::new();
    cache.refresh_from(&StaticDock(dock_row()));

    let apps = vec![
        AppInfo::new(300, "Safari", true, false),
        AppInfo::new(301, "Mail", false, false),
    ];
    let regions = cache.snapshot();

    let safari_center = regions[1].rect.center();
    let Verdict::Suppress(target) = decide(safari_center, &regions, &apps) else {
        panic!("expected the click to be suppressed");
    };
    assert_eq!(target.pid, 300);

    let windows = FakeWindows::new(&[false, true]);
    assert_eq!(
        toggle_windows(&windows, target.pid).unwrap(),
        ToggleOutcome::MinimizedAll
    );
    assert_eq!(windows.snapshot(), vec![true, true]);

    // The next click on the now fully minimized set restores everything.
    assert_eq!(
        toggle_windows(&windows, target.pid).unwrap(),
        ToggleOutcome::RestoredAll
    );
    assert_eq!(windows.snapshot(), vec![false, false]);
}

#[test]
fn click_on_backgrounded_app_is_left_to_the_os() {
    let cache = GeometryCache::new();
    cache.refresh_from(&StaticDock(dock_row()));
    let regions = cache.snapshot();

    let apps = vec![
        AppInfo::new(300, "Safari", false, false),
        AppInfo::new(301, "Mail", true, false),
    ];
    let safari_center = regions[1].rect.center();
    assert_eq!(decide(safari_center, &regions, &apps), Verdict::PassThrough);
}

#[test]
fn failed_refresh_fails_open_to_pass_through() {
    let cache = GeometryCache::new();
    cache.refresh_from(&StaticDock(dock_row()));
    // The dock becomes unreadable; the cache clears rather than serving
    // stale regions forever.
    cache.refresh_from(&BrokenDock);

    let apps = vec![AppInfo::new(300, "Safari", true, false)];
    let verdict = decide(Point::new(96.0, 1072.0), &cache.snapshot(), &apps);
    assert_eq!(verdict, Verdict::PassThrough);
}

#[test]
fn stale_region_for_quit_app_passes_through() {
    let cache = GeometryCache::new();
    cache.refresh_from(&StaticDock(dock_row()));
    let regions = cache.snapshot();

    // Safari quit since the last refresh; its region is stale.
    let apps = vec![AppInfo::new(100, "Finder", true, false)];
    let safari_center = regions[1].rect.center();
    assert_eq!(decide(safari_center, &regions, &apps), Verdict::PassThrough);
}

#[test]
fn truncated_dock_label_still_resolves() {
    let regions = vec![IconRegion::new(
        Rect::new(0.0, 1040.0, 64.0, 64.0),
        "Preview",
    )];
    let apps = vec![AppInfo::new(42, "Preview Mode", true, false)];

    let Verdict::Suppress(target) = decide(regions[0].rect.center(), &regions, &apps) else {
        panic!("substring label should resolve");
    };
    assert_eq!(target.pid, 42);
}
