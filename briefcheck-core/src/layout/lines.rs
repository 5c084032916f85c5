use crate::types::{join_runs, BoundingBox, Page, TextLine};

/// Group a page's runs into visual lines.
///
/// Runs are visited top to bottom; a run joins the current line when its
/// vertical overlap with the line band is at least `tolerance` of the
/// shorter of the two heights. Raised footnote markers therefore stay on
/// the line they decorate, while separate double-spaced lines never touch.
pub fn group_lines(page: &mut Page, tolerance: f32) {
    let mut order: Vec<usize> = (0..page.runs.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&page.runs[a].bbox, &page.runs[b].bbox);
        ra.top.total_cmp(&rb.top).then(ra.left.total_cmp(&rb.left))
    });

    let mut bands: Vec<(BoundingBox, Vec<usize>)> = Vec::new();
    for index in order {
        let bbox = page.runs[index].bbox;
        let joins = bands.last().is_some_and(|(band, _)| {
            let shorter = bbox.height().min(band.height()).max(f32::EPSILON);
            band.vertical_overlap(&bbox) / shorter >= tolerance
        });
        match bands.last_mut() {
            Some((band, members)) if joins => {
                band.left = band.left.min(bbox.left);
                band.top = band.top.min(bbox.top);
                band.right = band.right.max(bbox.right);
                band.bottom = band.bottom.max(bbox.bottom);
                members.push(index);
            }
            _ => bands.push((bbox, vec![index])),
        }
    }

    page.lines = bands
        .into_iter()
        .enumerate()
        .map(|(line_index, (bbox, mut members))| {
            members.sort_by(|&a, &b| page.runs[a].bbox.left.total_cmp(&page.runs[b].bbox.left));
            for &r in &members {
                page.runs[r].line = line_index;
            }
            let baseline = members
                .iter()
                .map(|&r| &page.runs[r])
                .max_by(|a, b| a.font_size.total_cmp(&b.font_size))
                .map(|r| r.baseline)
                .unwrap_or(bbox.bottom);
            let text = join_runs(members.iter().map(|&r| &page.runs[r]));
            TextLine {
                runs: members,
                bbox,
                baseline,
                text,
            }
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageStatus, StyleFlags, TextRun, Zone};

    fn run(text: &str, left: f32, baseline: f32, size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_name: "Times".to_string(),
            font_size: size,
            flags: StyleFlags::default(),
            bbox: BoundingBox::new(left, baseline - size, left + text.len() as f32 * size * 0.5, baseline + size * 0.2),
            baseline,
            zone: Zone::Body,
            line: 0,
        }
    }

    fn page(runs: Vec<TextRun>) -> Page {
        Page {
            index: 1,
            width_pt: 612.0,
            height_pt: 792.0,
            runs,
            lines: Vec::new(),
            separators: Vec::new(),
            margins: None,
            page_number: None,
            status: PageStatus::Readable,
            is_addendum: false,
            is_table_page: false,
        }
    }

    #[test]
    fn test_superscript_marker_stays_on_its_line() {
        let mut p = page(vec![
            run("word.", 108.0, 108.0, 12.0),
            run("3", 140.0, 104.0, 8.0),
            run("Next", 150.0, 108.0, 12.0),
            run("Second line", 108.0, 132.0, 12.0),
        ]);
        group_lines(&mut p, 0.5);
        assert_eq!(p.lines.len(), 2);
        assert_eq!(p.lines[0].text, "word. 3 Next");
        assert_eq!(p.lines[0].baseline, 108.0);
        assert_eq!(p.runs[1].line, 0);
        assert_eq!(p.runs[3].line, 1);
    }

    #[test]
    fn test_runs_are_ordered_left_to_right() {
        let mut p = page(vec![run("right", 300.0, 200.0, 12.0), run("left", 108.0, 200.0, 12.0)]);
        group_lines(&mut p, 0.5);
        assert_eq!(p.lines[0].text, "left right");
    }
}
