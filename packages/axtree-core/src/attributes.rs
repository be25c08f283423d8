//! Attribute keys for the typed attribute bags on [`NodeData`](crate::NodeData).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoolAttribute {
    Busy,
    Clickable,
    EditableRoot,
    LiveAtomic,
    Modal,
    Scrollable,
    Selected,
    SupportsTextLocation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntAttribute {
    ActivedescendantId,
    AriaCellColumnIndex,
    AriaCellRowIndex,
    AriaColumnCount,
    AriaRowCount,
    Color,
    ErrormessageId,
    HierarchicalLevel,
    InPageLinkTargetId,
    MemberOfId,
    NextOnLineId,
    PopupForId,
    PosInSet,
    PreviousOnLineId,
    ScrollX,
    ScrollY,
    SetSize,
    TableCellColumnIndex,
    TableCellColumnSpan,
    TableCellRowIndex,
    TableCellRowSpan,
    TableColumnCount,
    TableColumnHeaderId,
    TableColumnIndex,
    TableHeaderId,
    TableRowCount,
    TableRowHeaderId,
    TableRowIndex,
    TextSelEnd,
    TextSelStart,
}

impl IntAttribute {
    /// Attributes whose value is the id of another node.
    pub fn is_node_id(self) -> bool {
        matches!(
            self,
            IntAttribute::ActivedescendantId
                | IntAttribute::ErrormessageId
                | IntAttribute::InPageLinkTargetId
                | IntAttribute::MemberOfId
                | IntAttribute::NextOnLineId
                | IntAttribute::PopupForId
                | IntAttribute::PreviousOnLineId
                | IntAttribute::TableColumnHeaderId
                | IntAttribute::TableHeaderId
                | IntAttribute::TableRowHeaderId
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FloatAttribute {
    FontSize,
    FontWeight,
    MaxValueForRange,
    MinValueForRange,
    StepValueForRange,
    TextIndent,
    ValueForRange,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StringAttribute {
    AriaRole,
    ClassName,
    Description,
    HtmlTag,
    /// Form control name; radio buttons sharing it form an implicit group.
    InputName,
    Language,
    Name,
    Placeholder,
    Url,
    Value,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntListAttribute {
    CharacterOffsets,
    ControlsIds,
    DescribedbyIds,
    DetailsIds,
    FlowtoIds,
    /// Nodes logically owned by a node without being its children.
    IndirectChildIds,
    LabelledbyIds,
    LineBreaks,
    RadioGroupIds,
    WordEnds,
    WordStarts,
}

impl IntListAttribute {
    pub fn is_node_id_list(self) -> bool {
        matches!(
            self,
            IntListAttribute::ControlsIds
                | IntListAttribute::DescribedbyIds
                | IntListAttribute::DetailsIds
                | IntListAttribute::FlowtoIds
                | IntListAttribute::IndirectChildIds
                | IntListAttribute::LabelledbyIds
                | IntListAttribute::RadioGroupIds
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StringListAttribute {
    CustomActionDescriptions,
    DropEffects,
}
