//! Call-chain introspection
//!
//! Resolving "who called us" needs the active call chain with the defining
//! module of each frame. [`CallChain`] abstracts where that chain comes from.
//! [`ScopedCallChain`] is the built-in source: each thread keeps a stack of
//! frames pushed by [`enter`] (usually through [`call_frame!`]) and popped
//! when the returned guard drops.

use std::cell::RefCell;
use std::marker::PhantomData;

use super::ModuleId;

/// One active invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Module that defines the invoked code
    pub module: ModuleId,
    /// Name of the invoked function, for diagnostics
    pub symbol: &'static str,
}

impl Frame {
    pub fn new(module: impl Into<ModuleId>, symbol: &'static str) -> Self {
        Self {
            module: module.into(),
            symbol,
        }
    }
}

/// Source of the active call chain
pub trait CallChain: Send + Sync {
    /// Visit frames innermost first and return the first one matching `pred`
    ///
    /// Returns `None` when no frame matches or the chain can't be inspected.
    /// Implementations stop walking at the first match.
    fn find_frame(&self, pred: &mut dyn FnMut(&Frame) -> bool) -> Option<Frame>;
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Call chain made of the frames entered on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedCallChain;

impl CallChain for ScopedCallChain {
    fn find_frame(&self, pred: &mut dyn FnMut(&Frame) -> bool) -> Option<Frame> {
        FRAMES
            .try_with(|frames| {
                let frames = frames.try_borrow().ok()?;
                frames.iter().rev().find(|frame| pred(frame)).cloned()
            })
            .ok()
            .flatten()
    }
}

/// Guard for a frame pushed with [`enter`]; pops it on drop
#[must_use = "the frame is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FrameGuard {
    depth: usize,
    // Frames live in a thread-local stack, so the guard must stay on this thread.
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = FRAMES.try_with(|frames| {
            if let Ok(mut frames) = frames.try_borrow_mut() {
                frames.truncate(self.depth);
            }
        });
    }
}

/// Push a frame onto the current thread's call chain
pub fn enter(module: impl Into<ModuleId>, symbol: &'static str) -> FrameGuard {
    let frame = Frame::new(module, symbol);
    let depth = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        frames.push(frame);
        frames.len() - 1
    });
    FrameGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Number of frames entered on the current thread
pub fn depth() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

/// Enter a frame owned by the crate this macro is expanded in
///
/// ```
/// fn on_save() {
///     let _frame = mod_utils::call_frame!("on_save");
///     // save/load calls made here are attributed to this crate
/// }
/// # on_save();
/// ```
#[macro_export]
macro_rules! call_frame {
    ($symbol:expr) => {
        $crate::identity::enter(
            $crate::identity::ModuleId::from_module_path(::core::module_path!()),
            $symbol,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn innermost() -> Option<Frame> {
        ScopedCallChain.find_frame(&mut |_| true)
    }

    #[test]
    fn test_guards_push_and_pop() {
        let base = depth();
        {
            let _outer = enter("host", "update");
            assert_eq!(depth(), base + 1);
            {
                let _inner = enter("car_tuner", "on_save");
                assert_eq!(depth(), base + 2);
                assert_eq!(innermost().unwrap().symbol, "on_save");
            }
            assert_eq!(depth(), base + 1);
            assert_eq!(innermost().unwrap().symbol, "update");
        }
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_find_frame_walks_innermost_first() {
        let _host = enter("host", "update");
        let _a = enter("mod_a", "tick");
        let _b = enter("mod_b", "callback");
        let _lib = enter("lib", "write_value");

        let mut visited = Vec::new();
        let found = ScopedCallChain.find_frame(&mut |frame| {
            visited.push(frame.symbol);
            frame.module.as_str() != "lib"
        });

        assert_eq!(found.unwrap().module.as_str(), "mod_b");
        // Walk stops at the first match
        assert_eq!(visited, vec!["write_value", "callback"]);
    }

    #[test]
    fn test_out_of_order_drop_truncates() {
        let base = depth();
        let outer = enter("host", "update");
        let inner = enter("mod_a", "tick");
        drop(outer);
        assert_eq!(depth(), base);
        drop(inner);
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_chains_are_per_thread() {
        let _frame = enter("mod_a", "tick");
        std::thread::spawn(|| {
            assert!(innermost().is_none());
        })
        .join()
        .unwrap();
        assert_eq!(innermost().unwrap().module.as_str(), "mod_a");
    }

    #[test]
    fn test_call_frame_macro_uses_this_crate() {
        let _frame = crate::call_frame!("macro_test");
        let frame = innermost().unwrap();
        assert_eq!(frame.module.as_str(), "mod_utils");
        assert_eq!(frame.symbol, "macro_test");
    }
}
