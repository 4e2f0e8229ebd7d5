//! Camera State Updates
//!
//! Folds decoded [`Telemetry`] into [`CameraState`], reporting which
//! [`StateField`] groups actually changed.

use crate::domain::models::{CameraState, ColorState, StateField, TransportMode};
use crate::infrastructure::bluetooth::protocol::telemetry::{
    AudioTelemetry, ColorTelemetry, ConfigTelemetry, DisplayTelemetry, LensTelemetry,
    MediaTelemetry, MetadataTelemetry, ReferenceTelemetry, TallyTelemetry, Telemetry,
    VideoTelemetry,
};

/// Store `value` in `slot`, recording `field` when it actually changed.
fn update<T: PartialEq>(
    slot: &mut T,
    value: T,
    field: StateField,
    changed: &mut Vec<StateField>,
) {
    if *slot != value {
        *slot = value;
        if !changed.contains(&field) {
            changed.push(field);
        }
    }
}

impl CameraState {
    /// Apply one decoded telemetry value, returning the groups that changed.
    pub fn apply(&mut self, telemetry: Telemetry) -> Vec<StateField> {
        let mut changed = Vec::new();
        match telemetry {
            Telemetry::Timecode(tc) => {
                update(&mut self.timecode, tc, StateField::Timecode, &mut changed)
            }
            Telemetry::CameraStatus(status) => {
                update(&mut self.status, status, StateField::Status, &mut changed)
            }
            Telemetry::Lens(t) => self.apply_lens(t, &mut changed),
            Telemetry::Video(t) => self.apply_video(t, &mut changed),
            Telemetry::Audio(t) => self.apply_audio(t, &mut changed),
            Telemetry::Display(t) => self.apply_display(t, &mut changed),
            Telemetry::Tally(t) => {
                let tally = &mut self.tally;
                let f = StateField::Tally;
                match t {
                    TallyTelemetry::Brightness(v) => {
                        update(&mut tally.brightness, v, f, &mut changed)
                    }
                    TallyTelemetry::Front(v) => update(&mut tally.front, v, f, &mut changed),
                    TallyTelemetry::Rear(v) => update(&mut tally.rear, v, f, &mut changed),
                }
            }
            Telemetry::Reference(t) => {
                let reference = &mut self.reference;
                let f = StateField::Reference;
                match t {
                    ReferenceTelemetry::Source(v) => {
                        update(&mut reference.source, v, f, &mut changed)
                    }
                    ReferenceTelemetry::Offset(v) => {
                        update(&mut reference.offset, v, f, &mut changed)
                    }
                }
            }
            Telemetry::Config(t) => self.apply_config(t, &mut changed),
            Telemetry::Color(t) => self.apply_color(t, &mut changed),
            Telemetry::Power(p) => {
                update(&mut self.power, Some(p), StateField::Power, &mut changed)
            }
            Telemetry::Media(t) => self.apply_media(t, &mut changed),
            Telemetry::Metadata(t) => self.apply_metadata(t, &mut changed),
        }
        changed
    }

    fn apply_lens(&mut self, t: LensTelemetry, changed: &mut Vec<StateField>) {
        let lens = &mut self.lens;
        match t {
            LensTelemetry::Focus(v) => update(&mut lens.focus, v, StateField::Focus, changed),
            LensTelemetry::Aperture { units } => {
                update(&mut lens.aperture_units, Some(units), StateField::Aperture, changed)
            }
            LensTelemetry::ApertureNormalized(v) => {
                update(&mut lens.aperture_normalized, v, StateField::Aperture, changed)
            }
            LensTelemetry::ApertureOrdinal(v) => {
                update(&mut lens.aperture_ordinal, v, StateField::Aperture, changed)
            }
            LensTelemetry::ImageStabilisation(v) => update(
                &mut lens.image_stabilisation,
                v,
                StateField::ImageStabilisation,
                changed,
            ),
            LensTelemetry::Zoom(v) => update(&mut lens.zoom, v, StateField::Zoom, changed),
            LensTelemetry::ZoomNormalized(v) => {
                update(&mut lens.zoom_normalized, v, StateField::Zoom, changed)
            }
            LensTelemetry::AutoFocusTriggered | LensTelemetry::AutoApertureTriggered => {}
        }
    }

    fn apply_video(&mut self, t: VideoTelemetry, changed: &mut Vec<StateField>) {
        let video = &mut self.video;
        match t {
            VideoTelemetry::Mode(mode) => {
                update(&mut video.mode, Some(mode), StateField::VideoMode, changed)
            }
            VideoTelemetry::WhiteBalance { kelvin, tint } => {
                update(&mut video.white_balance, kelvin, StateField::WhiteBalance, changed);
                update(&mut video.tint, tint, StateField::WhiteBalance, changed);
            }
            VideoTelemetry::Exposure(v) => {
                update(&mut video.exposure_us, v, StateField::Exposure, changed)
            }
            VideoTelemetry::DynamicRange(v) => {
                update(&mut video.dynamic_range, v, StateField::ImageProcessing, changed)
            }
            VideoTelemetry::Sharpening(v) => {
                update(&mut video.sharpening, v, StateField::ImageProcessing, changed)
            }
            VideoTelemetry::AutoExposureMode(v) => {
                update(&mut video.auto_exposure_mode, v, StateField::Exposure, changed)
            }
            VideoTelemetry::ShutterAngle(v) => {
                update(&mut video.shutter_angle, v, StateField::ShutterAngle, changed)
            }
            VideoTelemetry::ShutterSpeed(v) => {
                update(&mut video.shutter_speed, v, StateField::ShutterSpeed, changed)
            }
            VideoTelemetry::Gain(v) => update(&mut video.gain, v, StateField::Gain, changed),
            VideoTelemetry::Iso(v) => update(&mut video.iso, v, StateField::Iso, changed),
            VideoTelemetry::AutoWhiteBalanceTriggered
            | VideoTelemetry::AutoWhiteBalanceRestored => {}
        }
    }

    fn apply_audio(&mut self, t: AudioTelemetry, changed: &mut Vec<StateField>) {
        let audio = &mut self.audio;
        let f = StateField::Audio;
        match t {
            AudioTelemetry::MicLevel(v) => update(&mut audio.mic_level, v, f, changed),
            AudioTelemetry::HeadphoneLevel(v) => update(&mut audio.headphone_level, v, f, changed),
            AudioTelemetry::HeadphoneProgramMix(v) => {
                update(&mut audio.headphone_program_mix, v, f, changed)
            }
            AudioTelemetry::SpeakerLevel(v) => update(&mut audio.speaker_level, v, f, changed),
            AudioTelemetry::InputType(v) => update(&mut audio.input_type, v, f, changed),
            AudioTelemetry::InputLevels { left, right } => {
                update(&mut audio.input_levels, (left, right), f, changed)
            }
            AudioTelemetry::PhantomPower(v) => update(&mut audio.phantom_power, v, f, changed),
        }
    }

    fn apply_display(&mut self, t: DisplayTelemetry, changed: &mut Vec<StateField>) {
        let display = &mut self.display;
        let f = StateField::Display;
        match t {
            DisplayTelemetry::Brightness(v) => update(&mut display.brightness, v, f, changed),
            DisplayTelemetry::Tools(v) => update(&mut display.tools, v, f, changed),
            DisplayTelemetry::ZebraLevel(v) => update(&mut display.zebra_level, v, f, changed),
            DisplayTelemetry::PeakingLevel(v) => update(&mut display.peaking_level, v, f, changed),
            DisplayTelemetry::ColorBarsSeconds(v) => {
                update(&mut display.color_bars_seconds, v, f, changed)
            }
            DisplayTelemetry::FocusAssist { method, color } => {
                update(&mut display.focus_assist_method, method, f, changed);
                update(&mut display.focus_assist_color, color, f, changed);
            }
            DisplayTelemetry::TimecodeDisplay(v) => {
                update(&mut display.timecode_display, v, StateField::TimecodeDisplay, changed)
            }
        }
    }

    fn apply_config(&mut self, t: ConfigTelemetry, changed: &mut Vec<StateField>) {
        let config = &mut self.config;
        let f = StateField::Config;
        match t {
            ConfigTelemetry::Clock { time, date } => {
                update(&mut config.time, time, f, changed);
                update(&mut config.date, date, f, changed);
            }
            ConfigTelemetry::Language(v) => update(&mut config.language, v, f, changed),
            ConfigTelemetry::Timezone(v) => update(&mut config.timezone_minutes, v, f, changed),
            ConfigTelemetry::Location {
                latitude,
                longitude,
            } => update(&mut config.location, Some((latitude, longitude)), f, changed),
        }
    }

    fn apply_color(&mut self, t: ColorTelemetry, changed: &mut Vec<StateField>) {
        let f = StateField::Color;
        match t {
            ColorTelemetry::Channels(group, channels) => {
                update(self.color.group_mut(group), channels, f, changed)
            }
            ColorTelemetry::Contrast { pivot, adjust } => {
                update(&mut self.color.contrast_pivot, pivot, f, changed);
                update(&mut self.color.contrast_adjust, adjust, f, changed);
            }
            ColorTelemetry::LumaMix(v) => update(&mut self.color.luma_mix, v, f, changed),
            ColorTelemetry::HueSaturation { hue, saturation } => {
                update(&mut self.color.hue, hue, f, changed);
                update(&mut self.color.saturation, saturation, f, changed);
            }
            ColorTelemetry::Reset => update(&mut self.color, ColorState::default(), f, changed),
        }
    }

    fn apply_media(&mut self, t: MediaTelemetry, changed: &mut Vec<StateField>) {
        let media = &mut self.media;
        match t {
            MediaTelemetry::Codec { codec, variant } => {
                update(&mut media.codec, codec, StateField::Codec, changed);
                update(&mut media.codec_variant, variant, StateField::Codec, changed);
            }
            MediaTelemetry::Transport(status) => {
                update(
                    &mut media.recording,
                    status.mode == TransportMode::Record,
                    StateField::Recording,
                    changed,
                );
                update(
                    &mut media.playing,
                    status.mode == TransportMode::Play,
                    StateField::Playing,
                    changed,
                );
                update(&mut media.transport, status, StateField::MediaSlots, changed);
            }
            MediaTelemetry::Playback { .. } | MediaTelemetry::StillCaptured => {}
        }
    }

    fn apply_metadata(&mut self, t: MetadataTelemetry, changed: &mut Vec<StateField>) {
        let metadata = &mut self.metadata;
        let f = StateField::Metadata;
        match t {
            MetadataTelemetry::Reel(v) => update(&mut metadata.reel, v, f, changed),
            MetadataTelemetry::SceneTags {
                tags,
                location,
                day,
            } => {
                update(&mut metadata.scene_tags, tags, f, changed);
                update(&mut metadata.location, location, f, changed);
                update(&mut metadata.day, day, f, changed);
            }
            MetadataTelemetry::Take { number, tags } => {
                update(&mut metadata.take, number, f, changed);
                update(&mut metadata.take_tags, tags, f, changed);
            }
            MetadataTelemetry::GoodTake(v) => update(&mut metadata.good_take, v, f, changed),
            MetadataTelemetry::SlateMode(v) => update(&mut metadata.slate_mode, v, f, changed),
            MetadataTelemetry::Text(field, text) => {
                update(metadata.text_mut(field), text, f, changed)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ColorChannels, ColorGroup, MetadataField, TransportStatus};
    use crate::infrastructure::bluetooth::protocol::codec;

    fn transport(mode: TransportMode) -> Telemetry {
        Telemetry::Media(MediaTelemetry::Transport(TransportStatus {
            mode,
            ..TransportStatus::default()
        }))
    }

    #[test]
    fn test_recording_sets_flags() {
        let mut state = CameraState::default();
        let changed = state.apply(transport(TransportMode::Record));
        assert!(state.media.recording);
        assert!(!state.media.playing);
        assert!(changed.contains(&StateField::Recording));
        assert!(!changed.contains(&StateField::Playing));

        let changed = state.apply(transport(TransportMode::Play));
        assert!(!state.media.recording);
        assert!(state.media.playing);
        assert!(changed.contains(&StateField::Recording));
        assert!(changed.contains(&StateField::Playing));
    }

    #[test]
    fn test_unchanged_value_reports_nothing() {
        let mut state = CameraState::default();
        let wb = Telemetry::Video(VideoTelemetry::WhiteBalance {
            kelvin: 5600,
            tint: 10,
        });
        assert_eq!(state.apply(wb.clone()), vec![StateField::WhiteBalance]);
        assert!(state.apply(wb).is_empty());
        assert_eq!(state.video.white_balance, 5600);
        assert_eq!(state.video.tint, 10);
    }

    #[test]
    fn test_aperture_units_stored() {
        let mut state = CameraState::default();
        assert_eq!(state.lens.aperture_units, None);
        state.apply(Telemetry::Lens(LensTelemetry::Aperture { units: 8192 }));
        let fstop = state.lens.aperture_units.map(codec::units_to_fstop).unwrap();
        assert!((fstop - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_reset_restores_defaults() {
        let mut state = CameraState::default();
        state.apply(Telemetry::Color(ColorTelemetry::Channels(
            ColorGroup::Gain,
            ColorChannels::uniform(2.0),
        )));
        assert_eq!(state.color.group(ColorGroup::Gain).red, 2.0);
        let changed = state.apply(Telemetry::Color(ColorTelemetry::Reset));
        assert_eq!(changed, vec![StateField::Color]);
        assert_eq!(state.color, ColorState::default());
    }

    #[test]
    fn test_metadata_text() {
        let mut state = CameraState::default();
        state.apply(Telemetry::Metadata(MetadataTelemetry::Text(
            MetadataField::Director,
            "Ana".to_string(),
        )));
        assert_eq!(state.metadata.text(MetadataField::Director), "Ana");
    }

    #[test]
    fn test_display_tools() {
        let mut state = CameraState::default();
        let changed = state.apply(Telemetry::Display(DisplayTelemetry::Tools(0b101)));
        assert_eq!(changed, vec![StateField::Display]);
        assert!(state.display.zebra());
        assert!(state.display.false_color());
    }
}
