//! Play audio — plays a referenced sound file on a named sound device.

use serde::{Deserialize, Serialize};

use crate::error::{MiniBarError, ValidationError};

/// Raw bytes of the sound file an action plays.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFile(Vec<u8>);

impl AudioFile {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for AudioFile {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AudioFile({} bytes)", self.0.len())
    }
}

/// Configuration of a play-audio action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayAudioAction {
    sound_device: String,
    file_name: String,
    #[serde(default)]
    file: AudioFile,
    /// Nominal percent; values above 100 clamp to the device maximum.
    volume: u16,
    #[serde(default)]
    on_repeat: bool,
}

impl PlayAudioAction {
    /// Create a builder for constructing a [`PlayAudioAction`].
    #[must_use]
    pub fn builder() -> PlayAudioActionBuilder {
        PlayAudioActionBuilder::default()
    }

    #[must_use]
    pub fn sound_device(&self) -> &str {
        &self.sound_device
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn file(&self) -> &AudioFile {
        &self.file
    }

    #[must_use]
    pub fn volume(&self) -> u16 {
        self.volume
    }

    #[must_use]
    pub fn on_repeat(&self) -> bool {
        self.on_repeat
    }

    #[must_use]
    pub fn description(&self) -> String {
        let mut desc = format!(
            "Play audiofile: {} (Volume: {}%)",
            self.file_name, self.volume
        );
        if self.on_repeat {
            desc.push_str(" (Repeating)");
        }
        desc
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] when:
    /// - `sound_device` is empty ([`ValidationError::EmptyDeviceName`])
    /// - `file_name` is empty ([`ValidationError::EmptyFileName`])
    pub fn validate(&self) -> Result<(), MiniBarError> {
        if self.sound_device.is_empty() {
            return Err(ValidationError::EmptyDeviceName.into());
        }
        if self.file_name.is_empty() {
            return Err(ValidationError::EmptyFileName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`PlayAudioAction`].
#[derive(Debug, Default)]
pub struct PlayAudioActionBuilder {
    sound_device: Option<String>,
    file_name: Option<String>,
    file: Option<AudioFile>,
    volume: Option<u16>,
    on_repeat: bool,
}

impl PlayAudioActionBuilder {
    #[must_use]
    pub fn sound_device(mut self, name: impl Into<String>) -> Self {
        self.sound_device = Some(name.into());
        self
    }

    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn file(mut self, file: impl Into<AudioFile>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn volume(mut self, volume: u16) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn on_repeat(mut self, on_repeat: bool) -> Self {
        self.on_repeat = on_repeat;
        self
    }

    /// Consume the builder, validate, and return a [`PlayAudioAction`].
    ///
    /// The volume defaults to 100%.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<PlayAudioAction, MiniBarError> {
        let action = PlayAudioAction {
            sound_device: self.sound_device.unwrap_or_default(),
            file_name: self.file_name.unwrap_or_default(),
            file: self.file.unwrap_or_default(),
            volume: self.volume.unwrap_or(100),
            on_repeat: self.on_repeat,
        };
        action.validate()?;
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PlayAudioActionBuilder {
        PlayAudioAction::builder()
            .sound_device("USB Speaker")
            .file_name("welcome.wav")
    }

    #[test]
    fn should_describe_file_and_volume() {
        let action = builder().volume(50).build().unwrap();
        assert_eq!(
            action.description(),
            "Play audiofile: welcome.wav (Volume: 50%)"
        );
    }

    #[test]
    fn should_append_repeating_qualifier_when_on_repeat() {
        let action = builder().volume(30).on_repeat(true).build().unwrap();
        assert_eq!(
            action.description(),
            "Play audiofile: welcome.wav (Volume: 30%) (Repeating)"
        );
    }

    #[test]
    fn should_default_to_full_volume_and_single_play() {
        let action = builder().build().unwrap();
        assert_eq!(action.volume(), 100);
        assert!(!action.on_repeat());
    }

    #[test]
    fn should_accept_volume_above_hundred() {
        let action = builder().volume(150).build().unwrap();
        assert_eq!(action.volume(), 150);
    }

    #[test]
    fn should_return_validation_error_when_device_is_empty() {
        let result = PlayAudioAction::builder().file_name("a.wav").build();
        assert!(matches!(
            result,
            Err(MiniBarError::Validation(ValidationError::EmptyDeviceName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_file_name_is_empty() {
        let result = PlayAudioAction::builder().sound_device("Speaker").build();
        assert!(matches!(
            result,
            Err(MiniBarError::Validation(ValidationError::EmptyFileName))
        ));
    }

    #[test]
    fn should_keep_file_bytes() {
        let action = builder().file(vec![1, 2, 3]).build().unwrap();
        assert_eq!(action.file().as_bytes(), &[1, 2, 3]);
        assert_eq!(format!("{:?}", action.file()), "AudioFile(3 bytes)");
    }
}
