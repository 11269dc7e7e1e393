//! GameView: maps a [`GameSnapshot`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::config::Palette;
use crate::core::snapshot::GameSnapshot;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Phase, PieceKind};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Resolved palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pieces: [Rgb; 7],
    pub ghost: Rgb,
    pub border: Rgb,
    pub bg: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            pieces: [
                Rgb::new(0x59, 0xCB, 0xE8),
                Rgb::new(0xF2, 0xD9, 0x4E),
                Rgb::new(0xB0, 0x84, 0xCC),
                Rgb::new(0x76, 0xC8, 0x93),
                Rgb::new(0xE8, 0x6A, 0x6A),
                Rgb::new(0x3D, 0x5A, 0xA9),
                Rgb::new(0xF9, 0x9D, 0x1C),
            ],
            ghost: Rgb::new(255, 255, 255),
            border: Rgb::new(0x32, 0x3c, 0x39),
            bg: Rgb::new(0x0E, 0x0E, 0x10),
        }
    }
}

impl Theme {
    /// Parse a palette. Entries that are not valid hex keep the stock color.
    pub fn from_palette(palette: &Palette) -> Self {
        let stock = Self::default();
        let parse = |name: &str, hex: &str, fallback: Rgb| {
            Rgb::from_hex(hex).unwrap_or_else(|| {
                log::warn!("palette entry {name} = {hex:?} is not a hex color");
                fallback
            })
        };
        let mut pieces = stock.pieces;
        for kind in PieceKind::ALL {
            pieces[kind.index()] = parse(kind.as_str(), palette.of(kind), stock.piece(kind));
        }
        Self {
            pieces,
            ghost: parse("GHOST", &palette.ghost, stock.ghost),
            border: parse("BORDER", &palette.border, stock.border),
            bg: parse("BG", &palette.bg, stock.bg),
        }
    }

    pub fn piece(&self, kind: PieceKind) -> Rgb {
        self.pieces[kind.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// Terminal renderer for the playfield and side panel.
#[derive(Debug, Clone)]
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
    theme: Theme,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 compensates for the usual glyph aspect ratio.
        Self::new(2, 1)
    }
}

const TEXT: Rgb = Rgb::new(220, 220, 220);
const FLASH: Rgb = Rgb::new(255, 255, 255);

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
            theme: Theme::default(),
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::plain(TEXT, Rgb::new(0, 0, 0)).into_cell(' '));

        let board_px_w = u16::from(snap.width) * self.cell_w;
        let board_px_h = u16::from(snap.height) * self.cell_h;
        let frame_w = board_px_w + 2;
        let frame_h = board_px_h + 2;

        let start_x = viewport.width.saturating_sub(frame_w) / 2;
        let start_y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(frame_h) / 2,
            AnchorY::Top => 0,
        };
        let origin = (start_x, start_y);

        let field = CellStyle {
            dim: true,
            ..CellStyle::plain(self.theme.border, self.theme.bg)
        };
        fb.fill_rect(start_x + 1, start_y + 1, board_px_w, board_px_h, ' ', field);
        draw_border(
            fb,
            start_x,
            start_y,
            frame_w,
            frame_h,
            CellStyle::plain(TEXT, Rgb::new(0, 0, 0)),
        );

        let flash = 1.0 - snap.timers.line_clear_progress();
        for (row, cells) in snap.rows().enumerate() {
            let clearing = snap.clearing.contains(&(row as i8));
            for (col, cell) in cells.iter().enumerate() {
                let (x, y) = (col as u16, row as u16);
                match cell {
                    Some(kind) => {
                        let mut fg = self.theme.piece(*kind);
                        if clearing {
                            fg = FLASH.blend_over(fg, flash);
                        }
                        let style = CellStyle {
                            bold: true,
                            ..CellStyle::plain(fg, self.theme.bg)
                        };
                        self.fill_cell_rect(fb, origin, x, y, '█', style);
                    }
                    None => self.fill_cell_rect(fb, origin, x, y, '·', field),
                }
            }
        }

        if let (Some(active), Some(ghost)) = (snap.active, snap.ghost) {
            let fg = self
                .theme
                .piece(active.kind)
                .blend_over(self.theme.bg, snap.ghost_alpha);
            let style = CellStyle::plain(fg, self.theme.bg);
            for square in ghost {
                if !active.cells.contains(&square) {
                    self.draw_square(fb, snap, origin, square, '░', style);
                }
            }
        }

        if let Some(active) = snap.active {
            let style = CellStyle {
                bold: true,
                ..CellStyle::plain(self.theme.piece(active.kind), self.theme.bg)
            };
            for square in active.cells {
                self.draw_square(fb, snap, origin, square, '█', style);
            }
        }

        self.draw_side_panel(fb, snap, viewport, start_x + frame_w, start_y);

        match snap.phase {
            Phase::Paused => draw_overlay_text(fb, origin, frame_w, frame_h / 2, "PAUSED"),
            Phase::GameOver => draw_overlay_text(fb, origin, frame_w, frame_h / 2, "GAME OVER"),
            _ if snap.timers.level_up_ms > 0 => {
                let mut banner = String::with_capacity(12);
                banner.push_str("LEVEL ");
                banner.push_str(&snap.level.to_string());
                draw_overlay_text(fb, origin, frame_w, frame_h / 3, &banner);
            }
            _ => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    /// Terminal position of a visible board cell.
    pub fn cell_origin(&self, origin: (u16, u16), col: u16, row: u16) -> (u16, u16) {
        (
            origin.0 + 1 + col * self.cell_w,
            origin.1 + 1 + row * self.cell_h,
        )
    }

    fn draw_square(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        origin: (u16, u16),
        (row, col): (i8, i8),
        ch: char,
        style: CellStyle,
    ) {
        // Rows above the visible field are in the hidden buffer.
        if row < 0 || col < 0 || row as u8 >= snap.height || col as u8 >= snap.width {
            return;
        }
        self.fill_cell_rect(fb, origin, col as u16, row as u16, ch, style);
    }

    fn fill_cell_rect(
        &self,
        fb: &mut FrameBuffer,
        origin: (u16, u16),
        col: u16,
        row: u16,
        ch: char,
        style: CellStyle,
    ) {
        let (px, py) = self.cell_origin(origin, col, row);
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        viewport: Viewport,
        frame_right: u16,
        start_y: u16,
    ) {
        let panel_x = frame_right.saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 8 {
            return;
        }

        let label = CellStyle {
            bold: true,
            ..CellStyle::plain(TEXT, Rgb::new(0, 0, 0))
        };
        let value = CellStyle::plain(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let dim = CellStyle { dim: true, ..value };

        let mut y = start_y;
        for (name, number) in [("SCORE", snap.score), ("LEVEL", snap.level), ("LINES", snap.lines)] {
            fb.put_str(panel_x, y, name, label);
            fb.put_u32(panel_x, y + 1, number, value);
            y = y.saturating_add(3);
        }

        fb.put_str(panel_x, y, "HOLD", label);
        match snap.hold {
            Some(kind) => {
                let style = if snap.can_hold {
                    CellStyle::plain(self.theme.piece(kind), Rgb::new(0, 0, 0))
                } else {
                    dim
                };
                fb.put_str(panel_x, y + 1, kind.as_str(), style);
            }
            None => fb.put_str(panel_x, y + 1, "-", dim),
        }
        y = y.saturating_add(3);

        if snap.next.is_empty() {
            return;
        }
        fb.put_str(panel_x, y, "NEXT", label);
        for kind in &snap.next {
            y = y.saturating_add(1);
            if y >= viewport.height {
                break;
            }
            let style = CellStyle::plain(self.theme.piece(*kind), Rgb::new(0, 0, 0));
            fb.put_str(panel_x, y, kind.as_str(), style);
        }
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_overlay_text(fb: &mut FrameBuffer, origin: (u16, u16), frame_w: u16, dy: u16, text: &str) {
    let text_w = text.chars().count() as u16;
    let x = origin.0.saturating_add(frame_w.saturating_sub(text_w) / 2);
    let style = CellStyle {
        bold: true,
        ..CellStyle::plain(FLASH, Rgb::new(0, 0, 0))
    };
    fb.put_str(x, origin.1.saturating_add(dy), text, style);
}
