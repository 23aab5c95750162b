// macOS event bridge
//
// Registers an NSObject subclass as observer for the three notifications
// the watcher cares about:
//   - NSWorkspaceDidWakeNotification        (workspace notification center)
//   - com.apple.screenIsUnlocked            (distributed notification center)
//   - com.apple.sessionDidBecomeActive      (distributed notification center)
// and parks a dedicated thread in the NSRunLoop that delivers them. The
// observer forwards each callback into the tokio channel; event delivery
// is serialised by the run loop, so the handlers never overlap.

use crate::watcher::event::SessionEvent;
use anyhow::{Context, Result};
use cocoa::base::{id, nil};
use cocoa::foundation::NSString;
use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel};
use std::ffi::c_void;
use std::sync::Once;
use tokio::sync::mpsc;

const OBSERVER_CLASS_NAME: &str = "ATSessionEventObserver";
const SENDER_IVAR: &str = "_eventSender";

static REGISTER_OBSERVER_CLASS: Once = Once::new();

extern "C" fn handle_wake(this: &Object, _cmd: Sel, _notification: id) {
    forward(this, SessionEvent::Wake);
}

extern "C" fn handle_unlock(this: &Object, _cmd: Sel, _notification: id) {
    forward(this, SessionEvent::Unlock);
}

extern "C" fn handle_login(this: &Object, _cmd: Sel, _notification: id) {
    forward(this, SessionEvent::Login);
}

fn forward(this: &Object, event: SessionEvent) {
    unsafe {
        let ptr: *mut c_void = *this.get_ivar(SENDER_IVAR);
        if ptr.is_null() {
            return;
        }
        let sender = &*(ptr as *const mpsc::Sender<SessionEvent>);
        // The run loop thread is not a runtime thread, so blocking here is fine
        if sender.blocking_send(event).is_err() {
            tracing::warn!(%event, "event channel closed, dropping notification");
        }
    }
}

fn observer_class() -> &'static Class {
    REGISTER_OBSERVER_CLASS.call_once(|| {
        let superclass = class!(NSObject);
        let mut decl = ClassDecl::new(OBSERVER_CLASS_NAME, superclass)
            .expect("observer class registered twice");
        decl.add_ivar::<*mut c_void>(SENDER_IVAR);
        unsafe {
            decl.add_method(
                sel!(handleWake:),
                handle_wake as extern "C" fn(&Object, Sel, id),
            );
            decl.add_method(
                sel!(handleUnlock:),
                handle_unlock as extern "C" fn(&Object, Sel, id),
            );
            decl.add_method(
                sel!(handleLogin:),
                handle_login as extern "C" fn(&Object, Sel, id),
            );
        }
        decl.register();
    });
    Class::get(OBSERVER_CLASS_NAME).expect("observer class not registered")
}

/// Start the notification bridge on a dedicated run-loop thread.
pub fn spawn(tx: mpsc::Sender<SessionEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("session-events".into())
        .spawn(move || run_event_loop(tx))
        .context("Failed to spawn the event bridge thread")?;
    Ok(())
}

fn run_event_loop(tx: mpsc::Sender<SessionEvent>) {
    unsafe {
        let observer: id = msg_send![observer_class(), new];
        // The sender lives as long as the run loop thread; never reclaimed
        let sender_ptr = Box::into_raw(Box::new(tx)) as *mut c_void;
        (*observer).set_ivar(SENDER_IVAR, sender_ptr);

        let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
        let workspace_center: id = msg_send![workspace, notificationCenter];
        let wake_name = NSString::alloc(nil).init_str("NSWorkspaceDidWakeNotification");
        let _: () = msg_send![workspace_center,
            addObserver: observer
            selector: sel!(handleWake:)
            name: wake_name
            object: nil];

        let distributed_center: id =
            msg_send![class!(NSDistributedNotificationCenter), defaultCenter];
        let unlock_name = NSString::alloc(nil).init_str("com.apple.screenIsUnlocked");
        let _: () = msg_send![distributed_center,
            addObserver: observer
            selector: sel!(handleUnlock:)
            name: unlock_name
            object: nil];
        let login_name = NSString::alloc(nil).init_str("com.apple.sessionDidBecomeActive");
        let _: () = msg_send![distributed_center,
            addObserver: observer
            selector: sel!(handleLogin:)
            name: login_name
            object: nil];

        tracing::info!("session notification observers registered");

        let run_loop: id = msg_send![class!(NSRunLoop), currentRunLoop];
        let _: () = msg_send![run_loop, run];
    }
}
