//! Process-wide output device owner.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{AudioOutput, DeviceError, OutputState};

/// Creates the output device on first use.
pub type OutputFactory = Box<dyn Fn() -> Result<Arc<dyn AudioOutput>, DeviceError> + Send + Sync>;

/// Owns one lazily-created output device.
///
/// [`SharedOutput::get`] creates the device on first call and always hands
/// back a running context: a suspended device is resumed and a closed one is
/// rebuilt through the factory. [`SharedOutput::shutdown`] is the explicit
/// teardown.
pub struct SharedOutput {
    factory: OutputFactory,
    slot: Mutex<Option<Arc<dyn AudioOutput>>>,
}

impl SharedOutput {
    /// Creates an accessor that builds its device with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AudioOutput>, DeviceError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            slot: Mutex::new(None),
        }
    }

    /// Creates an accessor around an already-built device.
    ///
    /// The device cannot be recreated: once it is closed or shut down,
    /// [`get`](Self::get) fails with [`DeviceError::Unavailable`].
    pub fn with_output(output: Arc<dyn AudioOutput>) -> Self {
        let template = Arc::clone(&output);
        let shared = Self::new(move || {
            if template.state() == OutputState::Closed {
                return Err(DeviceError::Unavailable(
                    "fixed output device was shut down".to_string(),
                ));
            }
            Ok(Arc::clone(&template))
        });
        *shared.slot.lock() = Some(output);
        shared
    }

    /// Returns the running output device, creating or resuming it as needed.
    pub fn get(&self) -> Result<Arc<dyn AudioOutput>, DeviceError> {
        let mut slot = self.slot.lock();

        if let Some(output) = slot.as_ref() {
            match output.state() {
                OutputState::Running => return Ok(Arc::clone(output)),
                OutputState::Suspended => {
                    debug!("audio output suspended, resuming");
                    output.resume()?;
                    return Ok(Arc::clone(output));
                }
                OutputState::Closed => {
                    debug!("audio output closed, recreating");
                    *slot = None;
                }
            }
        }

        let output = (self.factory)()?;
        match output.state() {
            OutputState::Running => {}
            OutputState::Suspended => output.resume()?,
            OutputState::Closed => return Err(DeviceError::Closed),
        }
        info!("audio output initialized");
        *slot = Some(Arc::clone(&output));
        Ok(output)
    }

    /// Returns true if a device has been created and not shut down.
    pub fn is_initialized(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Closes and drops the device. The next [`get`](Self::get) creates a new one.
    pub fn shutdown(&self) {
        if let Some(output) = self.slot.lock().take() {
            output.close();
            info!("audio output shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::VirtualOutput;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(
        count: Arc<AtomicUsize>,
        suspended: bool,
    ) -> impl Fn() -> Result<Arc<dyn AudioOutput>, DeviceError> + Send + Sync {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            let output = if suspended {
                VirtualOutput::suspended()
            } else {
                VirtualOutput::new()
            };
            Ok(Arc::new(output) as Arc<dyn AudioOutput>)
        }
    }

    #[test]
    fn test_lazy_single_initialization() {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = SharedOutput::new(counting_factory(count.clone(), false));
        assert!(!shared.is_initialized());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let a = shared.get().unwrap();
        let b = shared.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resumes_suspended_device() {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = SharedOutput::new(counting_factory(count, true));
        let output = shared.get().unwrap();
        assert_eq!(output.state(), OutputState::Running);
    }

    #[test]
    fn test_shutdown_then_recreate() {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = SharedOutput::new(counting_factory(count.clone(), false));
        let first = shared.get().unwrap();
        shared.shutdown();
        assert_eq!(first.state(), OutputState::Closed);
        assert!(!shared.is_initialized());

        let second = shared.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fixed_output_is_not_recreated() {
        let device: Arc<dyn AudioOutput> = Arc::new(VirtualOutput::new());
        let shared = SharedOutput::with_output(Arc::clone(&device));
        assert!(shared.is_initialized());
        assert!(Arc::ptr_eq(&shared.get().unwrap(), &device));

        shared.shutdown();
        assert_eq!(device.state(), OutputState::Closed);
        assert!(matches!(shared.get(), Err(DeviceError::Unavailable(_))));
        assert!(!shared.is_initialized());
    }

    #[test]
    fn test_factory_error_propagates() {
        let shared = SharedOutput::new(|| Err(DeviceError::Unavailable("no sink".to_string())));
        assert!(matches!(shared.get(), Err(DeviceError::Unavailable(_))));
        assert!(!shared.is_initialized());
    }
}
