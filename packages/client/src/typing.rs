//! Typing indicator with client-side idle timeout.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use renraku_server::infrastructure::dto::websocket::ClientEvent;

/// Idle window after the last keystroke before `typing-stop` is sent.
pub const TYPING_IDLE_WINDOW: Duration = Duration::from_secs(2);

/// Per-conversation typing notifier.
///
/// 最初のキー入力で `typing-start` を一度だけ送り、以後のキー入力は
/// アイドルタイマーをリセットするだけで再送しない。最後の入力から
/// 2 秒経過するか、notifier が drop されると `typing-stop` を送る。
/// タイマーはクライアント側だけで持ち、サーバーは状態を持たない。
pub struct TypingNotifier {
    keystrokes: mpsc::UnboundedSender<()>,
}

impl TypingNotifier {
    pub fn new(outbound: mpsc::UnboundedSender<ClientEvent>, conversation_id: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            let mut typing = false;
            let mut deadline = Instant::now();

            loop {
                if typing {
                    tokio::select! {
                        key = rx.recv() => match key {
                            Some(()) => deadline = Instant::now() + TYPING_IDLE_WINDOW,
                            // Notifier dropped
                            None => break,
                        },
                        _ = sleep_until(deadline) => {
                            let _ = outbound.send(ClientEvent::TypingStop {
                                conversation_id: conversation_id.clone(),
                            });
                            typing = false;
                        }
                    }
                } else {
                    match rx.recv().await {
                        Some(()) => {
                            let _ = outbound.send(ClientEvent::TypingStart {
                                conversation_id: conversation_id.clone(),
                            });
                            typing = true;
                            deadline = Instant::now() + TYPING_IDLE_WINDOW;
                        }
                        None => break,
                    }
                }
            }

            // Closing mid-typing still stops the indicator on the other side
            if typing {
                let _ = outbound.send(ClientEvent::TypingStop { conversation_id });
            }
        });

        Self { keystrokes: tx }
    }

    /// Report one keystroke in the conversation.
    pub fn keystroke(&self) {
        let _ = self.keystrokes.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::{advance, timeout};

    async fn recv_event(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
        timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_keystroke_sends_typing_start_once() {
        // テスト項目: 最初のキー入力で typing-start が一度だけ送られる
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = TypingNotifier::new(tx, "conv-1".to_string());

        // when (操作): 連続して2回入力する
        notifier.keystroke();
        notifier.keystroke();

        // then (期待する結果): typing-start は1通のみ
        let event = recv_event(&mut rx).await;
        assert_eq!(
            event,
            ClientEvent::TypingStart {
                conversation_id: "conv-1".to_string()
            }
        );
        advance(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_window_sends_typing_stop() {
        // テスト項目: 最後の入力から2秒で typing-stop が送られる
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = TypingNotifier::new(tx, "conv-1".to_string());
        notifier.keystroke();
        let _ = recv_event(&mut rx).await;

        // when (操作): アイドルウィンドウを経過させる
        let event = recv_event(&mut rx).await;

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::TypingStop {
                conversation_id: "conv-1".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_resets_idle_timer() {
        // テスト項目: 追加のキー入力でアイドルタイマーがリセットされる
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = TypingNotifier::new(tx, "conv-1".to_string());
        notifier.keystroke();
        let _ = recv_event(&mut rx).await;

        // when (操作): 1.5秒ごとに入力を続ける
        advance(Duration::from_millis(1500)).await;
        notifier.keystroke();
        tokio::task::yield_now().await;
        advance(Duration::from_millis(1500)).await;

        // then (期待する結果): 3秒経過しても typing-stop は送られていない
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_while_typing_sends_typing_stop() {
        // テスト項目: 入力中に notifier を drop すると typing-stop が送られる
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = TypingNotifier::new(tx, "conv-1".to_string());
        notifier.keystroke();
        let _ = recv_event(&mut rx).await;

        // when (操作):
        drop(notifier);

        // then (期待する結果):
        let event = recv_event(&mut rx).await;
        assert_eq!(
            event,
            ClientEvent::TypingStop {
                conversation_id: "conv-1".to_string()
            }
        );
    }
}
