// Windows event bridge
//
// A message-only window on a dedicated thread receives WM_POWERBROADCAST
// (resume from sleep) and, when session notifications can be registered,
// WM_WTSSESSION_CHANGE (unlock and logon). The window procedure forwards
// each recognised message into the tokio channel.

use crate::watcher::event::SessionEvent;
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use windows::core::w;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Power::PBT_APMRESUMEAUTOMATIC;
use windows::Win32::System::RemoteDesktop::{
    WTSRegisterSessionNotification, WTSUnRegisterSessionNotification, NOTIFY_FOR_THIS_SESSION,
    WM_WTSSESSION_CHANGE, WTS_SESSION_LOGON, WTS_SESSION_UNLOCK,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DispatchMessageW, GetMessageW, RegisterClassW,
    TranslateMessage, HWND_MESSAGE, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_POWERBROADCAST,
    WNDCLASSW,
};

/// The window procedure has no user-data slot we control before window
/// creation completes, so the sender is parked in process-wide storage.
static EVENT_SENDER: OnceCell<mpsc::Sender<SessionEvent>> = OnceCell::new();

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_POWERBROADCAST if wparam.0 as u32 == PBT_APMRESUMEAUTOMATIC => {
            forward(SessionEvent::Wake);
            LRESULT(1)
        }
        WM_WTSSESSION_CHANGE if wparam.0 as u32 == WTS_SESSION_UNLOCK => {
            forward(SessionEvent::Unlock);
            LRESULT(0)
        }
        WM_WTSSESSION_CHANGE if wparam.0 as u32 == WTS_SESSION_LOGON => {
            forward(SessionEvent::Login);
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

fn forward(event: SessionEvent) {
    if let Some(sender) = EVENT_SENDER.get() {
        // The message loop thread is not a runtime thread
        if sender.blocking_send(event).is_err() {
            warn!(%event, "event channel closed, dropping notification");
        }
    }
}

/// Start the notification bridge on a dedicated message-loop thread.
pub fn spawn(tx: mpsc::Sender<SessionEvent>) -> Result<()> {
    EVENT_SENDER
        .set(tx)
        .map_err(|_| anyhow::anyhow!("event bridge already started"))?;

    std::thread::Builder::new()
        .name("session-events".into())
        .spawn(|| {
            if let Err(err) = run_message_loop() {
                error!(%err, "session event loop failed");
            }
        })
        .context("Failed to spawn the event bridge thread")?;

    Ok(())
}

fn run_message_loop() -> Result<()> {
    unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None)
            .context("GetModuleHandleW failed")?
            .into();

        let class_name = w!("AttendanceTrackerPowerMonitor");
        let window_class = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: instance,
            lpszClassName: class_name,
            ..Default::default()
        };

        if RegisterClassW(&window_class) == 0 {
            anyhow::bail!("RegisterClassW failed");
        }

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class_name,
            w!("PowerMonitor"),
            WINDOW_STYLE(0),
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            None,
            instance,
            None,
        )
        .context("CreateWindowExW failed")?;

        // Unlock/logon need an explicit registration; wake does not.
        // Degrades to wake-only if the registration is refused.
        let mut session_notifications = false;
        match WTSRegisterSessionNotification(hwnd, NOTIFY_FOR_THIS_SESSION) {
            Ok(()) => {
                session_notifications = true;
                info!("registered for session change notifications");
            }
            Err(err) => {
                warn!(%err, "session notifications unavailable, unlock/logon events disabled");
            }
        }

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        if session_notifications {
            let _ = WTSUnRegisterSessionNotification(hwnd);
        }
    }

    Ok(())
}
