//! Timeline synchronization: every clip and the audio cycle share one length.

use crate::AnimationHelper;

/// Stretch every mesh and camera action and the audio cycle to the longest
/// authored duration among them plus the afterglow. Returns the new length.
pub(crate) fn sync_durations(helper: &mut AnimationHelper) -> f32 {
    let camera_mixer = helper.camera.as_ref().and_then(|c| c.mixer.as_ref());
    let clips = helper
        .meshes
        .values()
        .filter_map(|m| m.mixer.as_ref())
        .chain(camera_mixer)
        .flat_map(|mixer| mixer.actions().iter().map(|a| a.authored_duration()));
    let audio = helper.audio.as_ref().map(|a| a.authored_duration());
    let longest = clips.chain(audio).fold(0.0f32, f32::max);
    let duration = longest + helper.config.afterglow;

    let camera_mixer = helper.camera.as_mut().and_then(|c| c.mixer.as_mut());
    for mixer in helper
        .meshes
        .values_mut()
        .filter_map(|m| m.mixer.as_mut())
        .chain(camera_mixer)
    {
        for action in mixer.actions_mut() {
            action.set_duration(duration);
        }
    }
    if let Some(audio) = helper.audio.as_mut() {
        audio.set_duration(duration);
    }
    log::debug!("synchronized timeline to {duration:.3}s");
    duration
}
