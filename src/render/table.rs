//! Tables.

use crate::model::{TableBlock, TableCell};

use super::{BlockRenderer, Element, RenderContext, element_id};

/// Largest colspan/rowspan passed through.
const MAX_SPAN: u32 = 64;

pub(super) fn render(r: &BlockRenderer, block: &TableBlock, ctx: &RenderContext<'_>) -> String {
    let rows: Vec<&Vec<TableCell>> = block.rows.iter().filter(|row| !row.is_empty()).collect();
    if rows.is_empty() {
        return String::new();
    }

    let has_head = rows.len() > 1 && rows[0].iter().all(|c| c.is_header);
    let (head, body) = if has_head { rows.split_at(1) } else { rows.split_at(0) };

    let mut inner = String::new();
    if !head.is_empty() {
        inner.push_str(&Element::new("thead").wrap(ctx.format, &render_rows(r, head, ctx)));
    }
    inner.push_str(&Element::new("tbody").wrap(ctx.format, &render_rows(r, body, ctx)));

    Element::new("table")
        .class("tbl")
        .attr_opt("id", element_id(&block.id))
        .style("border-collapse", "collapse")
        .style("width", "100%")
        .style("margin", "1em 0")
        .wrap(ctx.format, &inner)
}

fn render_rows(r: &BlockRenderer, rows: &[&Vec<TableCell>], ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    for row in rows {
        let cells: String = row.iter().map(|cell| render_cell(r, cell, ctx)).collect();
        out.push_str(&Element::new("tr").wrap(ctx.format, &cells));
    }
    out
}

fn render_cell(r: &BlockRenderer, cell: &TableCell, ctx: &RenderContext<'_>) -> String {
    let span = |v: Option<u32>| v.filter(|n| *n > 1).map(|n| n.min(MAX_SPAN).to_string());
    let mut el = Element::new(if cell.is_header { "th" } else { "td" })
        .attr_opt("colspan", span(cell.colspan))
        .attr_opt("rowspan", span(cell.rowspan))
        .style("border", "1px solid #d1d5db")
        .style("padding", "0.35em 0.6em");
    if cell.is_header {
        el = el.style("background", "#f3f4f6");
    }
    if let Some(align) = cell.align {
        el = el
            .class_if(ctx.format.is_xhtml(), format!("align-{}", align.as_str()))
            .style("text-align", align.as_str());
    }
    el.wrap(ctx.format, &r.rich(&cell.content, ctx.format))
}
