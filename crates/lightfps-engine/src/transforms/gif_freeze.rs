//! GIF freeze: replace animated GIF sources with a still PNG of their
//! first frame.
//!
//! Images that cannot be read back (cross-origin, undecodable, missing)
//! keep animating; the failure is only logged.

use lightfps_page::{Canvas, LoadedImage, NodeId, PageResult, Window};

use super::elements;
use crate::report::{Step, StepReport};

const GIF_SELECTOR: &str = r#"img[src$=".gif" i]"#;

pub fn apply(window: &mut Window) -> StepReport {
    let mut report = StepReport::default();
    for id in elements(window.document(), GIF_SELECTOR) {
        let outcome = freeze(window, id);
        report.record(Step::GifFreeze, id, outcome);
    }
    report
}

fn freeze(window: &mut Window, id: NodeId) -> PageResult<bool> {
    let Some(src) = window.document().attr(id, "src").map(str::to_string) else {
        return Ok(false);
    };
    let resource = window.resources().load(&src)?;
    let image = LoadedImage::from_resource(&resource)?;
    let mut canvas = Canvas::new(image.natural_width(), image.natural_height());
    canvas.draw_image(&image, 0, 0);
    let still = canvas.to_data_url("image/png")?;
    window.document_mut().set_attr(id, "src", &still)?;
    Ok(true)
}
