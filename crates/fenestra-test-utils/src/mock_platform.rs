//! Scripted `Platform` implementation for testing.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use fenestra_core::{
    alloc::HashMap,
    geometry::Size,
    graphics::GraphicsContext,
    input::MouseCursor,
    math::IVec2,
    platform::{
        ClipboardData, Damage, NativeEvent, NativeHandle, Platform, PlatformError,
        ViewDescriptor, ViewHandle,
    },
};
use parking_lot::Mutex;

use crate::mock_graphics::RecordingGraphics;

/// Records a platform call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    CreateView {
        view: ViewHandle,
        title: String,
        size: Size<u32>,
        parent: Option<NativeHandle>,
        transient_for: Option<ViewHandle>,
    },
    DestroyView(ViewHandle),
    Show(ViewHandle),
    Hide(ViewHandle),
    SetSize {
        view: ViewHandle,
        size: Size<u32>,
    },
    SetGeometryConstraints {
        view: ViewHandle,
        min_size: Size<u32>,
        keep_aspect_ratio: bool,
    },
    SetResizable {
        view: ViewHandle,
        resizable: bool,
    },
    SetTitle {
        view: ViewHandle,
        title: String,
    },
    SetOffset {
        view: ViewHandle,
        offset: IVec2,
    },
    Raise(ViewHandle),
    GrabFocus(ViewHandle),
    PostRedisplay {
        view: ViewHandle,
        damage: Damage,
    },
    SetClipboard {
        view: ViewHandle,
        mime_type: String,
    },
    SetCursor {
        view: ViewHandle,
        cursor: MouseCursor,
    },
    StartTimer {
        view: ViewHandle,
        id: u64,
        interval: Duration,
    },
    StopTimer {
        view: ViewHandle,
        id: u64,
    },
    Update {
        timeout: Duration,
    },
}

#[derive(Debug, Clone)]
struct MockView {
    size: Size<u32>,
    offset: IVec2,
    visible: bool,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<PlatformCall>,
    views: HashMap<ViewHandle, MockView>,
    order: Vec<ViewHandle>,
    next_view: u64,
    queued: VecDeque<(ViewHandle, NativeEvent)>,
    fail_realize: bool,
    scale_factor: f64,
    clipboard: Option<ClipboardData>,
    configure_on_resize: bool,
    expose_on_redisplay: bool,
    with_graphics: bool,
}

/// Native backend double.
///
/// By default it behaves like a cooperative window manager: `set_size` is granted and answered
/// with a `Configure` event, and `post_redisplay` queues one `Expose` per view.
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
    graphics: RecordingGraphics,
}

/// Shared view into a [`MockPlatform`] that stays usable after the platform is boxed.
#[derive(Clone)]
pub struct MockPlatformHandle {
    state: Arc<Mutex<MockState>>,
    graphics: RecordingGraphics,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                views: HashMap::new(),
                order: Vec::new(),
                next_view: 1,
                queued: VecDeque::new(),
                fail_realize: false,
                scale_factor: 1.0,
                clipboard: None,
                configure_on_resize: true,
                expose_on_redisplay: true,
                with_graphics: true,
            })),
            graphics: RecordingGraphics::new(),
        }
    }

    /// Desktop scale factor reported for every view.
    pub fn with_scale_factor(self, scale_factor: f64) -> Self {
        self.state.lock().scale_factor = scale_factor;
        self
    }

    /// Makes every `create_view` fail.
    pub fn failing_realize(self) -> Self {
        self.state.lock().fail_realize = true;
        self
    }

    /// Views report no graphics context.
    pub fn without_graphics(self) -> Self {
        self.state.lock().with_graphics = false;
        self
    }

    /// Size requests are recorded but never answered with a configure event.
    pub fn without_auto_configure(self) -> Self {
        self.state.lock().configure_on_resize = false;
        self
    }

    pub fn handle(&self) -> MockPlatformHandle {
        MockPlatformHandle {
            state: self.state.clone(),
            graphics: self.graphics.clone(),
        }
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatformHandle {
    /// Queues a native event for the next `update`.
    pub fn push_event(&self, view: ViewHandle, event: NativeEvent) {
        self.state.lock().queued.push_back((view, event));
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn count_redisplays(&self, view: ViewHandle) -> usize {
        self.count_calls(|call| matches!(call, PlatformCall::PostRedisplay { view: v, .. } if *v == view))
    }

    pub fn count_updates(&self) -> usize {
        self.count_calls(|call| matches!(call, PlatformCall::Update { .. }))
    }

    /// Views in creation order, destroyed ones included.
    pub fn created_views(&self) -> Vec<ViewHandle> {
        self.state.lock().order.clone()
    }

    pub fn is_visible(&self, view: ViewHandle) -> bool {
        self.state
            .lock()
            .views
            .get(&view)
            .is_some_and(|view| view.visible)
    }

    pub fn view_size(&self, view: ViewHandle) -> Option<Size<u32>> {
        self.state.lock().views.get(&view).map(|view| view.size)
    }

    pub fn graphics(&self) -> RecordingGraphics {
        self.graphics.clone()
    }

    pub fn set_scale_factor(&self, scale_factor: f64) {
        self.state.lock().scale_factor = scale_factor;
    }
}

impl MockState {
    fn record(&mut self, call: PlatformCall) {
        self.calls.push(call);
    }

    fn view_mut(&mut self, view: ViewHandle) -> Result<&mut MockView, PlatformError> {
        self.views
            .get_mut(&view)
            .ok_or(PlatformError::UnknownView(view))
    }
}

impl Platform for MockPlatform {
    fn create_view(&mut self, descriptor: &ViewDescriptor) -> Result<ViewHandle, PlatformError> {
        let mut state = self.state.lock();
        if state.fail_realize {
            return Err(PlatformError::ViewCreation("mock realize failure".into()));
        }
        let view = ViewHandle::new(state.next_view);
        state.next_view += 1;
        state.views.insert(
            view,
            MockView {
                size: descriptor.size,
                offset: IVec2::ZERO,
                visible: descriptor.parent.is_some(),
            },
        );
        state.order.push(view);
        state.record(PlatformCall::CreateView {
            view,
            title: descriptor.title.clone(),
            size: descriptor.size,
            parent: descriptor.parent,
            transient_for: descriptor.transient_for,
        });
        Ok(view)
    }

    fn destroy_view(&mut self, view: ViewHandle) {
        let mut state = self.state.lock();
        state.views.remove(&view);
        state.queued.retain(|(v, _)| *v != view);
        state.record(PlatformCall::DestroyView(view));
    }

    fn show(&mut self, view: ViewHandle) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?.visible = true;
        state.record(PlatformCall::Show(view));
        Ok(())
    }

    fn hide(&mut self, view: ViewHandle) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?.visible = false;
        state.record(PlatformCall::Hide(view));
        Ok(())
    }

    fn size(&self, view: ViewHandle) -> Option<Size<u32>> {
        self.state.lock().views.get(&view).map(|view| view.size)
    }

    fn set_size(&mut self, view: ViewHandle, size: Size<u32>) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let configure = state.configure_on_resize;
        let mock = state.view_mut(view)?;
        if configure {
            mock.size = size;
        }
        state.record(PlatformCall::SetSize { view, size });
        if configure {
            state.queued.push_back((
                view,
                NativeEvent::Configure {
                    width: size.width as f64,
                    height: size.height as f64,
                },
            ));
        }
        Ok(())
    }

    fn set_geometry_constraints(
        &mut self,
        view: ViewHandle,
        min_size: Size<u32>,
        keep_aspect_ratio: bool,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?;
        state.record(PlatformCall::SetGeometryConstraints {
            view,
            min_size,
            keep_aspect_ratio,
        });
        Ok(())
    }

    fn set_resizable(&mut self, view: ViewHandle, resizable: bool) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?;
        state.record(PlatformCall::SetResizable { view, resizable });
        Ok(())
    }

    fn set_title(&mut self, view: ViewHandle, title: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?;
        state.record(PlatformCall::SetTitle {
            view,
            title: title.to_owned(),
        });
        Ok(())
    }

    fn offset(&self, view: ViewHandle) -> Option<IVec2> {
        self.state.lock().views.get(&view).map(|view| view.offset)
    }

    fn set_offset(&mut self, view: ViewHandle, offset: IVec2) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.view_mut(view)?.offset = offset;
        state.record(PlatformCall::SetOffset { view, offset });
        Ok(())
    }

    fn raise(&mut self, view: ViewHandle) {
        self.state.lock().record(PlatformCall::Raise(view));
    }

    fn grab_focus(&mut self, view: ViewHandle) {
        self.state.lock().record(PlatformCall::GrabFocus(view));
    }

    fn post_redisplay(&mut self, view: ViewHandle, damage: &Damage) {
        let mut state = self.state.lock();
        state.record(PlatformCall::PostRedisplay {
            view,
            damage: damage.clone(),
        });
        let already_queued = state
            .queued
            .iter()
            .any(|(v, event)| *v == view && matches!(event, NativeEvent::Expose));
        if state.expose_on_redisplay && !already_queued && state.views.contains_key(&view) {
            state.queued.push_back((view, NativeEvent::Expose));
        }
    }

    fn desktop_scale_factor(&self, view: ViewHandle) -> Option<f64> {
        let state = self.state.lock();
        state.views.contains_key(&view).then_some(state.scale_factor)
    }

    fn native_handle(&self, view: ViewHandle) -> Option<NativeHandle> {
        let state = self.state.lock();
        state
            .views
            .contains_key(&view)
            .then(|| NativeHandle(0x1000 + view.raw() as usize))
    }

    fn set_clipboard(&mut self, view: ViewHandle, mime_type: &str, data: &[u8]) -> bool {
        let mut state = self.state.lock();
        if !state.views.contains_key(&view) {
            return false;
        }
        state.clipboard = Some(ClipboardData {
            mime_type: mime_type.to_owned(),
            data: data.to_vec(),
        });
        state.record(PlatformCall::SetClipboard {
            view,
            mime_type: mime_type.to_owned(),
        });
        true
    }

    fn clipboard(&mut self, view: ViewHandle) -> Option<ClipboardData> {
        let state = self.state.lock();
        if !state.views.contains_key(&view) {
            return None;
        }
        state.clipboard.clone()
    }

    fn set_cursor(&mut self, view: ViewHandle, cursor: MouseCursor) -> bool {
        let mut state = self.state.lock();
        if !state.views.contains_key(&view) {
            return false;
        }
        state.record(PlatformCall::SetCursor { view, cursor });
        true
    }

    fn start_timer(&mut self, view: ViewHandle, id: u64, interval: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.views.contains_key(&view) {
            return false;
        }
        state.record(PlatformCall::StartTimer { view, id, interval });
        true
    }

    fn stop_timer(&mut self, view: ViewHandle, id: u64) -> bool {
        let mut state = self.state.lock();
        if !state.views.contains_key(&view) {
            return false;
        }
        state.record(PlatformCall::StopTimer { view, id });
        true
    }

    fn update(&mut self, timeout: Duration) -> Vec<(ViewHandle, NativeEvent)> {
        let mut state = self.state.lock();
        state.record(PlatformCall::Update { timeout });
        let events: Vec<_> = state.queued.drain(..).collect();
        tracing::trace!(count = events.len(), "mock platform update");
        events
    }

    fn graphics(&mut self, view: ViewHandle) -> Option<&mut (dyn GraphicsContext + 'static)> {
        let state = self.state.lock();
        if !state.with_graphics || !state.views.contains_key(&view) {
            return None;
        }
        drop(state);
        Some(&mut self.graphics)
    }
}
