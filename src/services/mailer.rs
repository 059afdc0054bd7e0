// src/services/mailer.rs

use async_trait::async_trait;

use crate::common::error::AppError;

/// Saída de e-mails da aplicação.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Credenciais de uma conta nova ou o link de redefinição de senha.
    async fn send_account_credentials(
        &self,
        email: &str,
        temporary_password: Option<&str>,
        reset_link: &str,
    ) -> Result<(), AppError>;

    /// Recibo PDF da declaração para o declarante.
    async fn send_declaration_receipt(&self, email: &str, reference: &str, pdf: Vec<u8>) -> Result<(), AppError>;
}

// Sem transporte SMTP: a mensagem fica registada no log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_account_credentials(
        &self,
        email: &str,
        temporary_password: Option<&str>,
        reset_link: &str,
    ) -> Result<(), AppError> {
        tracing::info!(
            "📧 Credenciais para {} (senha temporária: {}) -> {}",
            email,
            if temporary_password.is_some() { "sim" } else { "não" },
            reset_link
        );
        Ok(())
    }

    async fn send_declaration_receipt(&self, email: &str, reference: &str, pdf: Vec<u8>) -> Result<(), AppError> {
        tracing::info!("📧 Recibo {} enviado para {} ({} bytes)", reference, email, pdf.len());
        Ok(())
    }
}

#[cfg(test)]
pub use recording::RecordingMailer;

#[cfg(test)]
mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Guarda as mensagens em memória para os testes.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        pub fn recipients(&self) -> Vec<String> {
            self.sent
                .lock()
                .map(|sent| sent.iter().map(|(to, _)| to.clone()).collect())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_account_credentials(
            &self,
            email: &str,
            _temporary_password: Option<&str>,
            reset_link: &str,
        ) -> Result<(), AppError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((email.to_string(), reset_link.to_string()));
            }
            Ok(())
        }

        async fn send_declaration_receipt(&self, email: &str, reference: &str, _pdf: Vec<u8>) -> Result<(), AppError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((email.to_string(), reference.to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn recording_mailer_keeps_recipients() {
        let mailer = RecordingMailer::default();
        mailer.send_declaration_receipt("a@b.ml", "DECL-BKO-001", vec![1, 2]).await.unwrap();
        assert_eq!(mailer.recipients(), vec!["a@b.ml".to_string()]);
    }
}
