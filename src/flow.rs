//! Application event loop.
//!
//! The [`App`] owns the tokio runtime, the window and GPU [`Context`], the
//! CPU side [`ViewerState`] and the uploaded [`SceneRenderer`]. It drives
//! the viewer from winit events:
//!
//! 1. `resumed` creates window and GPU context and starts loading the asset
//! 2. `user_event` receives the load result ([`ViewerEvent::AssetLoaded`]) and
//!    brings the scene up, or stops the loop ([`ViewerEvent::Shutdown`])
//! 3. `RedrawRequested` advances animation and controls, renders one frame
//!    and requests the next one
//! 4. `Resized` updates frustum and surface

use std::{fmt::Debug, path::PathBuf, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    render::{self, SceneRenderer},
    resources::{LoadedAsset, load_asset},
    viewer::{SceneState, ViewerState},
};

/// Events sent to the event loop from outside of it.
pub enum ViewerEvent {
    AssetLoaded(anyhow::Result<LoadedAsset>),
    Shutdown,
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetLoaded(Ok(_)) => f.write_str("AssetLoaded(Ok(..))"),
            Self::AssetLoaded(Err(e)) => f.debug_tuple("AssetLoaded").field(e).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// The in-flight asset load. Dropping it cancels the load.
pub struct LoadTask {
    handle: tokio::task::JoinHandle<()>,
}

impl LoadTask {
    /// Loads `path` on `runtime` and posts the result to the event loop.
    pub fn spawn(
        runtime: &tokio::runtime::Runtime,
        path: PathBuf,
        proxy: EventLoopProxy<ViewerEvent>,
    ) -> Self {
        let handle = runtime.spawn(async move {
            log::info!("Loading {}", path.display());
            let result = load_asset(&path).await;
            if proxy.send_event(ViewerEvent::AssetLoaded(result)).is_err() {
                log::debug!("Event loop closed before {} finished loading", path.display());
            }
        });
        Self { handle }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Stops a running viewer from any thread.
#[derive(Clone)]
pub struct StopHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl StopHandle {
    /// Asks the event loop to exit. Returns `false` if it already has.
    pub fn stop(&self) -> bool {
        self.proxy.send_event(ViewerEvent::Shutdown).is_ok()
    }
}

struct GpuState {
    ctx: Context,
    scene: Option<SceneRenderer>,
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    state: Option<ViewerState>,
    gpu: Option<GpuState>,
    load: Option<LoadTask>,
    // Set when initialisation fails; returned from `run`.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            proxy,
            config,
            state: None,
            gpu: None,
            load: None,
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height))
            .with_transparent(true);
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let mut ctx = self
            .async_runtime
            .block_on(Context::new(window.clone(), &self.config))?;
        let size = window.inner_size();
        let state = ViewerState::new(self.config.clone(), size.width, size.height);
        ctx.camera.write(&ctx.queue, &state.camera);

        self.load = Some(LoadTask::spawn(
            &self.async_runtime,
            self.config.asset.clone(),
            self.proxy.clone(),
        ));
        self.state = Some(state);
        self.gpu = Some(GpuState { ctx, scene: None });
        window.request_redraw();
        Ok(())
    }

    fn bring_up(&mut self, result: anyhow::Result<LoadedAsset>) {
        let (Some(state), Some(gpu)) = (&mut self.state, &mut self.gpu) else {
            return;
        };
        state.on_load_result(result);
        if let SceneState::Loaded(scene) = &state.scene {
            match SceneRenderer::upload(&mut gpu.ctx, &scene.graph) {
                Ok(renderer) => gpu.scene = Some(renderer),
                Err(e) => log::error!("Unable to upload the scene: {:#}", e),
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(state), Some(gpu)) = (&mut self.state, &mut self.gpu) else {
            return;
        };
        state.tick();
        gpu.ctx.camera.write(&gpu.ctx.queue, &state.camera);
        if let (Some(renderer), SceneState::Loaded(scene)) = (&mut gpu.scene, &state.scene) {
            renderer.write_transforms(&gpu.ctx.queue, &scene.graph);
        }

        match render::render(&gpu.ctx, gpu.scene.as_ref(), &state.camera) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.ctx.reconfigure(),
            Err(e) => log::error!("Unable to render {}", e),
        }
        gpu.ctx.window().request_redraw();
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(load) = self.load.take() {
            if !load.is_finished() {
                log::info!("Cancelling the pending asset load");
            }
            load.abort();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.error = Some(e);
            self.shutdown(event_loop);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        log::debug!("{:?}", event);
        match event {
            ViewerEvent::AssetLoaded(result) => {
                self.load = None;
                self.bring_up(result);
            }
            ViewerEvent::Shutdown => self.shutdown(event_loop),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        state.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if state.resize(size.width, size.height) {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.ctx.resize(size.width, size.height);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// A configured viewer whose event loop has not started yet.
pub struct Viewer {
    event_loop: EventLoop<ViewerEvent>,
    app: App,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
        let app = App::new(&event_loop, config)?;
        Ok(Self { event_loop, app })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            proxy: self.event_loop.create_proxy(),
        }
    }

    /// Runs until the window is closed or a [`StopHandle`] stops it.
    pub fn run(self) -> anyhow::Result<()> {
        let Self { event_loop, mut app } = self;
        event_loop.run_app(&mut app)?;
        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("ortho_viewer=info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    Viewer::new(config)?.run()
}
