//! The surface a canvas is mounted on: size lookup plus an event listener
//! registry. `WindowHost` implements it on top of a winit window.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    Resize { width: u32, height: u32 },
}

impl CanvasEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CanvasEvent::PointerDown { .. } => EventKind::PointerDown,
            CanvasEvent::PointerMove { .. } => EventKind::PointerMove,
            CanvasEvent::PointerUp => EventKind::PointerUp,
            CanvasEvent::PointerLeave => EventKind::PointerLeave,
            CanvasEvent::Resize { .. } => EventKind::Resize,
        }
    }

    pub fn pointer(&self) -> Option<Vec2> {
        match *self {
            CanvasEvent::PointerDown { x, y } | CanvasEvent::PointerMove { x, y } => {
                Some(Vec2::new(x, y))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub trait MountHost {
    /// Size in physical pixels of the mount named `mount_id`, if it exists.
    fn mount_size(&self, mount_id: &str) -> Option<(u32, u32)>;
    fn add_listener(&mut self, kind: EventKind) -> ListenerId;
    /// Returns `false` if `id` was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

/// Listener registry shared by host implementations.
#[derive(Debug, Default)]
pub struct ListenerTable {
    next: u64,
    entries: Vec<(ListenerId, EventKind)>,
}

impl ListenerTable {
    pub fn add(&mut self, kind: EventKind) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.entries.push((id, kind));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(l, _)| *l != id);
        self.entries.len() != before
    }

    /// Listeners for `kind` in registration order.
    pub fn targets(&self, kind: EventKind) -> Vec<ListenerId> {
        self.entries
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A winit window acting as a single named mount.
pub struct WindowHost {
    mount_id: String,
    size: (u32, u32),
    cursor: Vec2,
    listeners: ListenerTable,
}

impl WindowHost {
    pub fn new(mount_id: impl Into<String>, size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self {
            mount_id: mount_id.into(),
            size: (size.width, size.height),
            cursor: Vec2::ZERO,
            listeners: ListenerTable::default(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Maps a window event to a canvas event, tracking the cursor.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<CanvasEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(CanvasEvent::PointerMove {
                    x: self.cursor.x,
                    y: self.cursor.y,
                })
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => CanvasEvent::PointerDown {
                    x: self.cursor.x,
                    y: self.cursor.y,
                },
                ElementState::Released => CanvasEvent::PointerUp,
            }),
            WindowEvent::CursorLeft { .. } => Some(CanvasEvent::PointerLeave),
            WindowEvent::Resized(size) => {
                self.size = (size.width, size.height);
                Some(CanvasEvent::Resize {
                    width: size.width,
                    height: size.height,
                })
            }
            _ => None,
        }
    }

    /// Registered listeners that should receive `event`.
    pub fn dispatch(&self, event: &CanvasEvent) -> Vec<ListenerId> {
        self.listeners.targets(event.kind())
    }
}

impl MountHost for WindowHost {
    fn mount_size(&self, mount_id: &str) -> Option<(u32, u32)> {
        (mount_id == self.mount_id).then_some(self.size)
    }

    fn add_listener(&mut self, kind: EventKind) -> ListenerId {
        self.listeners.add(kind)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};
    use winit::event::DeviceId;

    fn host() -> WindowHost {
        WindowHost::new("canvas", PhysicalSize::new(800, 600))
    }

    #[test]
    fn only_the_named_mount_resolves() {
        let h = host();
        assert_eq!(h.mount_size("canvas"), Some((800, 600)));
        assert_eq!(h.mount_size("other"), None);
    }

    #[test]
    fn dispatch_reaches_registered_listeners_only() {
        let mut h = host();
        let a = h.add_listener(EventKind::PointerMove);
        let b = h.add_listener(EventKind::PointerMove);
        let c = h.add_listener(EventKind::PointerUp);

        let mv = CanvasEvent::PointerMove { x: 1.0, y: 2.0 };
        assert_eq!(h.dispatch(&mv), vec![a, b]);
        assert_eq!(h.dispatch(&CanvasEvent::PointerUp), vec![c]);

        assert!(h.remove_listener(a));
        assert!(!h.remove_listener(a));
        assert_eq!(h.dispatch(&mv), vec![b]);
        assert_eq!(h.listener_count(), 2);
    }

    #[test]
    fn press_uses_last_cursor_position() {
        let mut h = host();
        let device_id = unsafe { DeviceId::dummy() };
        h.translate(&WindowEvent::CursorMoved {
            device_id,
            position: PhysicalPosition::new(12.0, 34.0),
        });
        let down = h.translate(&WindowEvent::MouseInput {
            device_id,
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        assert_eq!(down, Some(CanvasEvent::PointerDown { x: 12.0, y: 34.0 }));
        assert_eq!(down.and_then(|e| e.pointer()), Some(Vec2::new(12.0, 34.0)));
    }

    #[test]
    fn resize_updates_mount_size() {
        let mut h = host();
        let ev = h.translate(&WindowEvent::Resized(PhysicalSize::new(1024, 768)));
        assert_eq!(ev, Some(CanvasEvent::Resize { width: 1024, height: 768 }));
        assert_eq!(h.mount_size("canvas"), Some((1024, 768)));
    }
}
