use tracing::info;
use tracing_subscriber::EnvFilter;
use vulkan::ContextBuilder;
use winit::{
    dpi::LogicalSize,
    event::{Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("vulkan")
        .with_inner_size(LogicalSize::new(800, 600))
        .build(&event_loop)?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let size = window.inner_size();
    let context = ContextBuilder::new().build(&window, size.width, size.height)?;

    info!(
        device = %context.device.physical_device.name,
        format = ?context.surface_format().format,
        width = context.extent().width,
        height = context.extent().height,
        images = context.image_views().len(),
        shared_queue = context.queues_alias(),
        "Ready to present"
    );

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        }
        | Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                },
            ..
        } => {
            elwt.exit();
        }
        _ => (),
    })?;

    Ok(())
}
