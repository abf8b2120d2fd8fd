use anyhow::Result;

pub trait ConfirmationDialog {
    fn confirm(&mut self, title: &str, message: &str) -> Result<bool>;
}

pub trait SurfaceMask {
    fn mask(&mut self, message: &str);
    fn unmask(&mut self);
}

pub trait Notifier {
    fn notify_success(&mut self, text: &str);
    fn notify_error(&mut self, text: &str);
}
