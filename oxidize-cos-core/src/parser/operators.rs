//! Content stream operator table
//!
//! Every standard operator with the operands it takes. Used to validate
//! parsed operators and to track the nesting of paired operators.

use crate::objects::{Node, NodeRef};

/// Kind of value an operand slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Number,
    Name,
    String,
    Array,
    /// Inline property dictionary or the name of one in the resources.
    Properties,
    InlineImage,
}

impl OperandKind {
    fn accepts(self, node: &Node) -> bool {
        match self {
            OperandKind::Number => node.is_number(),
            OperandKind::Name => matches!(node, Node::Name(_)),
            OperandKind::String => matches!(node, Node::LiteralString(_) | Node::HexString(_)),
            OperandKind::Array => matches!(node, Node::Array(_)),
            OperandKind::Properties => matches!(node, Node::Dictionary(_) | Node::Name(_)),
            OperandKind::InlineImage => matches!(node, Node::InlineImage(_)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandRule {
    Exact(&'static [OperandKind]),
    /// One or more numbers. With `pattern`, the last operand may instead be
    /// a pattern name.
    Color { pattern: bool },
}

/// Effect of an operator on the nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Open,
    Close,
    Neutral,
}

use OperandKind::{Array as A, InlineImage as I, Name as N, Number as F, Properties as P, String as S};

const NONE: &[OperandKind] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    CloseFillStroke,
    FillStroke,
    CloseFillStrokeEvenOdd,
    FillStrokeEvenOdd,
    BeginMarkedContentProps,
    BeginInlineImage,
    BeginMarkedContent,
    BeginText,
    BeginCompat,
    CurveTo,
    ConcatMatrix,
    SetStrokeColorSpace,
    SetFillColorSpace,
    SetDash,
    SetCharWidth,
    SetCacheDevice,
    PaintXObject,
    MarkPointProps,
    EndInlineImage,
    EndMarkedContent,
    EndText,
    EndCompat,
    Fill,
    FillObsolete,
    FillEvenOdd,
    SetStrokeGray,
    SetFillGray,
    SetGraphicsState,
    ClosePath,
    SetFlatness,
    InlineImageData,
    SetLineJoin,
    SetLineCap,
    SetStrokeCmyk,
    SetFillCmyk,
    LineTo,
    MoveTo,
    SetMiterLimit,
    MarkPoint,
    EndPath,
    Save,
    Restore,
    Rectangle,
    SetStrokeRgb,
    SetFillRgb,
    SetRenderingIntent,
    CloseStroke,
    Stroke,
    SetStrokeColor,
    SetFillColor,
    SetStrokeColorN,
    SetFillColorN,
    ShadingFill,
    NextLine,
    SetCharSpacing,
    MoveText,
    MoveTextSetLeading,
    SetFont,
    ShowText,
    ShowTextArray,
    SetLeading,
    SetTextMatrix,
    SetTextRenderMode,
    SetTextRise,
    SetWordSpacing,
    SetHorizontalScaling,
    CurveToInitial,
    SetLineWidth,
    Clip,
    ClipEvenOdd,
    CurveToFinal,
    NextLineShowText,
    NextLineShowTextSpaced,
    Unknown,
}

impl OpCode {
    pub fn from_name(name: &str) -> Self {
        use OpCode::*;
        match name {
            "b" => CloseFillStroke,
            "B" => FillStroke,
            "b*" => CloseFillStrokeEvenOdd,
            "B*" => FillStrokeEvenOdd,
            "BDC" => BeginMarkedContentProps,
            "BI" => BeginInlineImage,
            "BMC" => BeginMarkedContent,
            "BT" => BeginText,
            "BX" => BeginCompat,
            "c" => CurveTo,
            "cm" => ConcatMatrix,
            "CS" => SetStrokeColorSpace,
            "cs" => SetFillColorSpace,
            "d" => SetDash,
            "d0" => SetCharWidth,
            "d1" => SetCacheDevice,
            "Do" => PaintXObject,
            "DP" => MarkPointProps,
            "EI" => EndInlineImage,
            "EMC" => EndMarkedContent,
            "ET" => EndText,
            "EX" => EndCompat,
            "f" => Fill,
            "F" => FillObsolete,
            "f*" => FillEvenOdd,
            "G" => SetStrokeGray,
            "g" => SetFillGray,
            "gs" => SetGraphicsState,
            "h" => ClosePath,
            "i" => SetFlatness,
            "ID" => InlineImageData,
            "j" => SetLineJoin,
            "J" => SetLineCap,
            "K" => SetStrokeCmyk,
            "k" => SetFillCmyk,
            "l" => LineTo,
            "m" => MoveTo,
            "M" => SetMiterLimit,
            "MP" => MarkPoint,
            "n" => EndPath,
            "q" => Save,
            "Q" => Restore,
            "re" => Rectangle,
            "RG" => SetStrokeRgb,
            "rg" => SetFillRgb,
            "ri" => SetRenderingIntent,
            "s" => CloseStroke,
            "S" => Stroke,
            "SC" => SetStrokeColor,
            "sc" => SetFillColor,
            "SCN" => SetStrokeColorN,
            "scn" => SetFillColorN,
            "sh" => ShadingFill,
            "T*" => NextLine,
            "Tc" => SetCharSpacing,
            "Td" => MoveText,
            "TD" => MoveTextSetLeading,
            "Tf" => SetFont,
            "Tj" => ShowText,
            "TJ" => ShowTextArray,
            "TL" => SetLeading,
            "Tm" => SetTextMatrix,
            "Tr" => SetTextRenderMode,
            "Ts" => SetTextRise,
            "Tw" => SetWordSpacing,
            "Tz" => SetHorizontalScaling,
            "v" => CurveToInitial,
            "w" => SetLineWidth,
            "W" => Clip,
            "W*" => ClipEvenOdd,
            "y" => CurveToFinal,
            "'" => NextLineShowText,
            "\"" => NextLineShowTextSpaced,
            _ => Unknown,
        }
    }

    /// Operand rule, `None` for unknown operators.
    pub fn rule(self) -> Option<OperandRule> {
        use OpCode::*;
        use OperandRule::{Color, Exact};
        let rule = match self {
            CloseFillStroke | FillStroke | CloseFillStrokeEvenOdd | FillStrokeEvenOdd
            | BeginText | BeginCompat | EndInlineImage | EndMarkedContent | EndText
            | EndCompat | Fill | FillObsolete | FillEvenOdd | ClosePath | InlineImageData
            | EndPath | Save | Restore | CloseStroke | Stroke | NextLine | Clip
            | ClipEvenOdd => Exact(NONE),
            SetFlatness | SetLineJoin | SetLineCap | SetMiterLimit | SetLineWidth
            | SetStrokeGray | SetFillGray | SetCharSpacing | SetLeading | SetTextRenderMode
            | SetTextRise | SetWordSpacing | SetHorizontalScaling => Exact(&[F]),
            MoveTo | LineTo | MoveText | MoveTextSetLeading | SetCharWidth => Exact(&[F, F]),
            SetStrokeRgb | SetFillRgb => Exact(&[F, F, F]),
            SetStrokeCmyk | SetFillCmyk | Rectangle | CurveToInitial | CurveToFinal => {
                Exact(&[F, F, F, F])
            }
            CurveTo | ConcatMatrix | SetTextMatrix | SetCacheDevice => {
                Exact(&[F, F, F, F, F, F])
            }
            SetStrokeColorSpace | SetFillColorSpace | SetGraphicsState | PaintXObject
            | SetRenderingIntent | ShadingFill | BeginMarkedContent | MarkPoint => Exact(&[N]),
            BeginMarkedContentProps | MarkPointProps => Exact(&[N, P]),
            SetDash => Exact(&[A, F]),
            SetFont => Exact(&[N, F]),
            ShowText | NextLineShowText => Exact(&[S]),
            ShowTextArray => Exact(&[A]),
            NextLineShowTextSpaced => Exact(&[F, F, S]),
            BeginInlineImage => Exact(&[I]),
            SetStrokeColor | SetFillColor => Color { pattern: false },
            SetStrokeColorN | SetFillColorN => Color { pattern: true },
            Unknown => return None,
        };
        Some(rule)
    }

    pub fn nesting(self) -> Nesting {
        use OpCode::*;
        match self {
            Save | BeginText | BeginMarkedContent | BeginMarkedContentProps | BeginCompat => {
                Nesting::Open
            }
            Restore | EndText | EndMarkedContent | EndCompat => Nesting::Close,
            _ => Nesting::Neutral,
        }
    }

    /// Checks `operands`, comments excluded, against the operand rule.
    pub fn check(self, operands: &[NodeRef]) -> Result<(), String> {
        match self.rule() {
            None => Err("unknown operator".to_string()),
            Some(OperandRule::Exact(kinds)) => {
                if operands.len() != kinds.len() {
                    return Err(format!(
                        "expected {} operands, found {}",
                        kinds.len(),
                        operands.len()
                    ));
                }
                for (i, (kind, operand)) in kinds.iter().zip(operands).enumerate() {
                    if !kind.accepts(operand) {
                        return Err(format!(
                            "operand {} should be {:?}, found {}",
                            i + 1,
                            kind,
                            operand.type_name()
                        ));
                    }
                }
                Ok(())
            }
            Some(OperandRule::Color { pattern }) => {
                let (last, components) = operands
                    .split_last()
                    .ok_or_else(|| "expected at least one operand".to_string())?;
                if let Some(bad) = components.iter().find(|op| !op.is_number()) {
                    return Err(format!("color component is a {}", bad.type_name()));
                }
                let pattern_name = pattern && matches!(**last, Node::Name(_));
                if !last.is_number() && !pattern_name {
                    return Err(format!("color component is a {}", last.type_name()));
                }
                Ok(())
            }
        }
    }
}
